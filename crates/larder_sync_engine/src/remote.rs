//! Remote store abstraction.
//!
//! The engine talks to exactly one [`RemoteStore`]; the REST and
//! cloud-drive transports are interchangeable implementations selected
//! by composition, never by branching inside the engine.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use larder_model::{CollectionBundle, Credential};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// The cross-device system of record.
///
/// Every method suspends the calling task for the duration of the
/// network exchange; none of them blocks a thread.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Uploads the given collections. The remote replaces each named
    /// collection wholesale.
    async fn push(&self, credential: &Credential, bundle: &CollectionBundle) -> SyncResult<()>;

    /// Downloads the remote snapshot. `Ok(None)` means the remote holds
    /// no backup yet, a legitimate first-run state rather than a
    /// failure.
    async fn pull(&self, credential: &Credential) -> SyncResult<Option<CollectionBundle>>;

    /// Checks that the credential is still accepted by the remote.
    async fn verify_credential(&self, credential: &Credential) -> SyncResult<()>;
}

/// A scriptable remote for testing engines and schedulers.
///
/// Records every pushed bundle, serves a configurable pull response,
/// and can inject failures and artificial latency.
#[derive(Debug, Default)]
pub struct MockRemote {
    pushed: Mutex<Vec<CollectionBundle>>,
    pull_response: Mutex<Option<CollectionBundle>>,
    fail_push: AtomicBool,
    fail_pull: AtomicBool,
    reject_credential: AtomicBool,
    push_calls: AtomicU64,
    pull_calls: AtomicU64,
    latency: Mutex<Option<Duration>>,
}

impl MockRemote {
    /// Creates a mock with no backup and no failures configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what `pull` returns (`None` = remote has no backup).
    pub fn set_pull_response(&self, bundle: Option<CollectionBundle>) {
        *self.pull_response.lock() = bundle;
    }

    /// Makes `push` fail with a retryable transport error.
    pub fn set_fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    /// Makes `pull` fail with a retryable transport error.
    pub fn set_fail_pull(&self, fail: bool) {
        self.fail_pull.store(fail, Ordering::SeqCst);
    }

    /// Makes every operation fail with an authentication error.
    pub fn set_reject_credential(&self, reject: bool) {
        self.reject_credential.store(reject, Ordering::SeqCst);
    }

    /// Adds artificial latency to every operation.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Every bundle pushed so far, oldest first.
    pub fn pushed(&self) -> Vec<CollectionBundle> {
        self.pushed.lock().clone()
    }

    /// The most recently pushed bundle.
    pub fn last_pushed(&self) -> Option<CollectionBundle> {
        self.pushed.lock().last().cloned()
    }

    /// Number of push attempts, including failed ones.
    pub fn push_calls(&self) -> u64 {
        self.push_calls.load(Ordering::SeqCst)
    }

    /// Number of pull attempts, including failed ones.
    pub fn pull_calls(&self) -> u64 {
        self.pull_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_credential(&self) -> SyncResult<()> {
        if self.reject_credential.load(Ordering::SeqCst) {
            Err(SyncError::Auth("credential rejected by mock".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn push(&self, _credential: &Credential, bundle: &CollectionBundle) -> SyncResult<()> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_credential()?;
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(SyncError::transport_retryable("injected push failure"));
        }
        self.pushed.lock().push(bundle.clone());
        Ok(())
    }

    async fn pull(&self, _credential: &Credential) -> SyncResult<Option<CollectionBundle>> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_credential()?;
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(SyncError::transport_retryable("injected pull failure"));
        }
        Ok(self.pull_response.lock().clone())
    }

    async fn verify_credential(&self, _credential: &Credential) -> SyncResult<()> {
        self.simulate_latency().await;
        self.check_credential()
    }
}
