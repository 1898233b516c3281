//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Write would exceed the medium's capacity
    #[error("Quota exceeded writing {key}: limit is {limit} bytes")]
    QuotaExceeded { key: String, limit: usize },

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Create a quota error for the given key.
    pub fn quota_exceeded(key: impl Into<String>, limit: usize) -> Self {
        Self::QuotaExceeded {
            key: key.into(),
            limit,
        }
    }
}
