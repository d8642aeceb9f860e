//! Error types for the local store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the local store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error from a durable backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value or a file on disk failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The caller asked for an invalid namespace or key.
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// Backend-specific failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
