//! Error types for the local store and its queues.

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while working with the local store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid {column} value in row {id}: {value}")]
    InvalidColumn {
        column: &'static str,
        id: i64,
        value: String,
    },
}
