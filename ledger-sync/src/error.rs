//! Error types for the sync engine.
//!
//! Offline is not represented here: an unreachable network is an expected
//! condition that skips the cycle, not an error.

/// Result type for sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] ledger_core::StoreError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("sync worker is no longer running")]
    WorkerGone,
}
