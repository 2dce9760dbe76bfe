//! Domain model and queue row types.
//!
//! Entity structs carry only the fields the sync engine touches; the
//! surrounding CRUD layer owns the rest of the schema. Timestamp columns
//! managed by SQLite (`created_at`, `uploaded_at`, `last_attempt`) are kept
//! as raw text, the engine orders by them but never interprets them.

use serde::{Deserialize, Serialize};

/// Mutation kind recorded with each outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Create => "CREATE",
            ChangeOp::Update => "UPDATE",
            ChangeOp::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(ChangeOp::Create),
            "UPDATE" => Some(ChangeOp::Update),
            "DELETE" => Some(ChangeOp::Delete),
            _ => None,
        }
    }
}

/// Delivery state of an outbox entry.
///
/// There is no intermediate FAILED state: a failed delivery stays PENDING
/// and is retried on the next cycle, until the dead-letter threshold moves
/// it to DEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    Pending,
    Done,
    Dead,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "PENDING",
            ChangeStatus::Done => "DONE",
            ChangeStatus::Dead => "DEAD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ChangeStatus::Pending),
            "DONE" => Some(ChangeStatus::Done),
            "DEAD" => Some(ChangeStatus::Dead),
            _ => None,
        }
    }
}

/// A row of the `sync_queue` outbox table.
///
/// Append-only: after creation only `status`, `attempts` and `last_attempt`
/// are ever mutated. Rows are never deleted; the queue doubles as an audit
/// trail of local mutations.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedChange {
    pub id: i64,
    /// Entity tag ("product", "provider", "order"); also the POST path segment.
    pub entity: String,
    /// The entity's natural key, used for idempotent upsert on the remote side.
    pub reference: String,
    /// Caller-constructed JSON describing the mutation, delivered verbatim.
    pub payload: String,
    pub operation: ChangeOp,
    pub status: ChangeStatus,
    pub attempts: u32,
    pub last_attempt: Option<String>,
    pub created_at: String,
}

/// Upload state of a queued document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Pending,
    Done,
    Error,
    /// The referenced local file no longer exists. Terminal: retrying will
    /// not bring the file back.
    Missing,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Done => "DONE",
            DocumentStatus::Error => "ERROR",
            DocumentStatus::Missing => "MISSING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(DocumentStatus::Pending),
            "DONE" => Some(DocumentStatus::Done),
            "ERROR" => Some(DocumentStatus::Error),
            "MISSING" => Some(DocumentStatus::Missing),
            _ => None,
        }
    }
}

/// A row of the `document_queue` table. The file itself stays on disk;
/// only its path is referenced here.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTask {
    pub id: i64,
    pub file_name: String,
    pub local_path: String,
    pub status: DocumentStatus,
    pub uploaded_at: Option<String>,
    /// Opaque caller-supplied string, passed through untouched.
    pub metadata: Option<String>,
}

/// Product snapshot, keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub provider_code: Option<String>,
    pub stock: i64,
    pub cost: f64,
    pub price: f64,
}

/// Provider snapshot, keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Lifecycle state of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Draft,
    Approved,
    Sent,
    Received,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Sent => "SENT",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(OrderStatus::Draft),
            "APPROVED" => Some(OrderStatus::Approved),
            "SENT" => Some(OrderStatus::Sent),
            "RECEIVED" => Some(OrderStatus::Received),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Purchase order snapshot, keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub code: String,
    /// Order date as ISO `YYYY-MM-DD`.
    pub date: Option<chrono::NaiveDate>,
    pub provider_code: Option<String>,
    pub total: f64,
    pub status: OrderStatus,
}
