//! Cursor store error types.
//!
//! Every variant means the backing store could not serve the request; a
//! missing key is never an error.

use thiserror::Error;

/// Cursor store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open or create the backing store.
    #[error("failed to open cursor store: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Underlying Redis error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// I/O error while preparing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A store call did not complete within its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The store operation that was attempted
        operation: &'static str,
        /// Deadline that elapsed
        after: std::time::Duration,
    },
}

/// Result type alias for cursor store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
