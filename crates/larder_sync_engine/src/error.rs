//! Error types for the sync engine.

use larder_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// "Remote has no backup yet" is deliberately not represented here: it
/// is a legitimate first-run state and surfaces as `Ok(None)` from
/// pull, never as an error.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a later cycle is expected to succeed.
        retryable: bool,
    },

    /// The remote rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response body did not parse as the expected envelope.
    #[error("malformed remote data: {0}")]
    MalformedData(String),

    /// Local store error while reading or applying collections.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// Another cycle is already in flight.
    #[error("sync cycle already in flight")]
    Busy,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later cycle may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Busy => true,
            SyncError::Auth(_) | SyncError::MalformedData(_) | SyncError::Store(_) => false,
        }
    }

    /// Returns true if the credential itself was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedData(err.to_string())
        } else if err.is_timeout() || err.is_connect() {
            SyncError::transport_retryable(err.to_string())
        } else {
            // Request building and redirect errors will not heal on
            // their own.
            SyncError::transport_fatal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::transport_fatal("bad certificate").is_retryable());
        assert!(SyncError::Busy.is_retryable());
        assert!(!SyncError::Auth("expired".into()).is_retryable());
        assert!(!SyncError::MalformedData("not json".into()).is_retryable());
    }

    #[test]
    fn auth_classification() {
        assert!(SyncError::Auth("expired".into()).is_auth());
        assert!(!SyncError::Busy.is_auth());
    }

    #[test]
    fn error_display() {
        let err = SyncError::Busy;
        assert_eq!(err.to_string(), "sync cycle already in flight");
    }
}
