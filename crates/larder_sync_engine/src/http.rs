//! Shared HTTP plumbing for the remote transports.

use crate::error::{SyncError, SyncResult};
use reqwest::StatusCode;
use std::time::Duration;

/// Builds a reqwest client with the given request timeout.
pub(crate) fn build_client(timeout: Duration) -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| SyncError::transport_fatal(err.to_string()))
}

/// Turns 401/403 into an auth error, passing every other status
/// through.
pub(crate) fn auth_checked(response: reqwest::Response) -> SyncResult<reqwest::Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Auth(format!(
            "remote rejected credential ({})",
            response.status()
        ))),
        _ => Ok(response),
    }
}

/// Classifies a non-2xx status: server-side failures are worth
/// retrying, the rest are not.
pub(crate) fn status_error(operation: &str, status: StatusCode) -> SyncError {
    SyncError::Transport {
        message: format!("{operation} returned {status}"),
        retryable: status.is_server_error(),
    }
}
