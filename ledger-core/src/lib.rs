//! Ledger Core Library
//!
//! Core functionality for the offline-first ledger including:
//! - Embedded SQLite store (schema, pragmas, connection handling)
//! - Domain model (Product, Provider, PurchaseOrder)
//! - Entity repositories with upsert-by-code semantics
//! - Durable outbox queue for outgoing mutations
//! - Document upload queue and managed document storage
//! - Referential integrity checking and store compaction

pub mod documents;
pub mod error;
pub mod integrity;
pub mod model;
pub mod outbox;
pub mod repository;
pub mod store;

pub use documents::{DocumentQueue, DocumentStore};
pub use error::{Result, StoreError};
pub use integrity::IntegrityChecker;
pub use model::{
    ChangeOp, ChangeStatus, DocumentStatus, DocumentTask, OrderStatus, Product, Provider,
    PurchaseOrder, QueuedChange,
};
pub use outbox::{OutboxQueue, QueueCounts};
pub use repository::{OrderRepository, ProductRepository, ProviderRepository};
pub use store::Store;
