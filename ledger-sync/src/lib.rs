//! Ledger Sync Engine
//!
//! Offline-first synchronization between the embedded ledger store and a
//! remote HTTP/JSON service:
//! - Connectivity probe with a bounded timeout
//! - Transport abstraction (HTTP over reqwest, mock for testing)
//! - Delivery worker draining the durable outbox in bounded batches
//! - Pull reconciler merging remote snapshots into local repositories
//! - Document upload cycle over the document queue
//! - `SyncService` façade owning the single background worker
//!
//! Enqueueing is synchronous and local-only; all network activity runs on
//! one dedicated worker task, so no two sync operations ever overlap.

pub mod config;
pub mod error;
pub mod probe;
pub mod pull;
pub mod push;
pub mod records;
pub mod service;
pub mod transport;
pub mod upload;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use probe::ConnectivityProbe;
pub use pull::{PullReconciler, PullReport};
pub use push::DeliveryWorker;
pub use service::{SyncHandle, SyncService};
pub use transport::{HttpTransport, MockTransport, SyncTransport};
pub use upload::{DocumentUploadService, DocumentUploader, UploadReport};
