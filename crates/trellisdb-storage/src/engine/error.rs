//! Storage error types.

use thiserror::Error;

/// Errors that can occur in storage operations.
///
/// Every variant is fatal to the index build in progress; the population
/// machinery performs no retries.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be opened or created.
    #[error("failed to open store: {0}")]
    Open(String),

    /// A write operation was attempted on a read-only transaction.
    #[error("write attempted on a read-only transaction")]
    ReadOnly,

    /// A transaction could not be started, committed, or rolled back.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend-internal failure.
    #[error("storage backend error: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
