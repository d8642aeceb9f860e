//! REST transport.
//!
//! The thinner of the two remote transports: a bearer-token API with
//! one endpoint per direction. `POST /sync/push` replaces the named
//! collections; `GET /sync/pull` returns the full remote snapshot or
//! 404 when no backup exists yet.

use crate::error::{SyncError, SyncResult};
use crate::http::{auth_checked, build_client, status_error};
use crate::remote::RemoteStore;
use async_trait::async_trait;
use larder_model::{CollectionBundle, Credential};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`RemoteStore`] backed by the sync REST API.
pub struct RestRemote {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct PushBody<'a> {
    collections: &'a CollectionBundle,
}

#[derive(Deserialize)]
struct PushAck {
    ok: bool,
}

#[derive(Deserialize)]
struct PullBody {
    collections: CollectionBundle,
}

impl RestRemote {
    /// Creates a client against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> SyncResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn push(&self, credential: &Credential, bundle: &CollectionBundle) -> SyncResult<()> {
        debug!(collections = bundle.len(), "pushing via REST");
        let response = self
            .http
            .post(self.endpoint("/sync/push"))
            .bearer_auth(&credential.token)
            .json(&PushBody {
                collections: bundle,
            })
            .send()
            .await?;

        let response = auth_checked(response)?;
        if !response.status().is_success() {
            return Err(status_error("push", response.status()));
        }

        let ack: PushAck = response
            .json()
            .await
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        if !ack.ok {
            return Err(SyncError::transport_retryable("push not acknowledged"));
        }
        Ok(())
    }

    async fn pull(&self, credential: &Credential) -> SyncResult<Option<CollectionBundle>> {
        let response = self
            .http
            .get(self.endpoint("/sync/pull"))
            .bearer_auth(&credential.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = auth_checked(response)?;
        if !response.status().is_success() {
            return Err(status_error("pull", response.status()));
        }

        let body: PullBody = response
            .json()
            .await
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        Ok(Some(body.collections))
    }

    async fn verify_credential(&self, credential: &Credential) -> SyncResult<()> {
        // The API has no dedicated verification endpoint; a pull
        // round-trip doubles as the check (404 still proves the token
        // was accepted).
        let response = self
            .http
            .get(self.endpoint("/sync/pull"))
            .bearer_auth(&credential.token)
            .send()
            .await?;
        auth_checked(response)?;
        Ok(())
    }
}
