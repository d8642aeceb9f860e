//! The sync engine.

use crate::error::{SyncError, SyncResult};
use crate::local;
use crate::merge;
use crate::remote::RemoteStore;
use crate::status::SyncStatus;
use larder_model::{CollectionBundle, CollectionName, Credential};
use larder_store::{LocalStore, MutationLog};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of a push cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// Whether anything was actually transmitted. `false` means there
    /// were no pending operations and the remote was never contacted.
    pub pushed: bool,
}

/// Result of a full sync cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// Whether the push phase transmitted anything.
    pub pushed: bool,
    /// The merged bundle from the pull phase, `None` if the remote has
    /// no backup yet.
    pub pulled: Option<CollectionBundle>,
}

/// The sync engine owns the push/pull protocol between the local store
/// and one remote store.
///
/// The engine is stateless between cycles except for the last-sync
/// timestamp and the mutation log it reads pending state from. It is
/// shared behind an [`Arc`] and enforces that at most one cycle is in
/// flight at a time; an overlapping call fails fast with
/// [`SyncError::Busy`].
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    log: Arc<MutationLog>,
    last_sync_at: RwLock<Option<Instant>>,
    in_flight: AtomicBool,
}

impl SyncEngine {
    /// Creates a new engine over the given store, remote, and mutation
    /// log.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        log: Arc<MutationLog>,
    ) -> Self {
        Self {
            store,
            remote,
            log,
            last_sync_at: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// The mutation log this engine drains on push.
    pub fn mutation_log(&self) -> &Arc<MutationLog> {
        &self.log
    }

    /// Pure read of the current sync state. Safe to call at any time,
    /// including mid-cycle.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            last_sync_ago: self.last_sync_at.read().map(|at| at.elapsed()),
            pending: self.log.pending_count(),
            is_syncing: self.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Pushes dirty collections to the remote.
    ///
    /// No-op when nothing is pending. On transport failure the dirty
    /// flags stay set, so a later cycle resends the collection's
    /// current content (at-least-once delivery).
    pub async fn push(&self, credential: &Credential) -> SyncResult<PushOutcome> {
        let _guard = self.begin_cycle()?;
        self.push_inner(credential).await
    }

    /// Pulls the remote snapshot and merges it into the local store.
    ///
    /// Returns the merged bundle for the caller to broadcast, or `None`
    /// when the remote has no backup yet.
    pub async fn pull(&self, credential: &Credential) -> SyncResult<Option<CollectionBundle>> {
        let _guard = self.begin_cycle()?;
        self.pull_inner(credential).await
    }

    /// Runs push then pull as one cycle.
    ///
    /// The ordering is load-bearing: pushing first is what lets a
    /// device's own just-made edits survive its own subsequent pull
    /// under the remote-wins merge policy.
    pub async fn sync(&self, credential: &Credential) -> SyncResult<SyncOutcome> {
        let _guard = self.begin_cycle()?;
        let outcome = self.push_inner(credential).await?;
        let pulled = self.pull_inner(credential).await?;
        Ok(SyncOutcome {
            pushed: outcome.pushed,
            pulled,
        })
    }

    /// Checks the credential against the remote without starting a
    /// cycle.
    ///
    /// The drive transport clears its cached connection state when the
    /// check fails, so the next connection restarts discovery from
    /// scratch.
    pub async fn verify(&self, credential: &Credential) -> SyncResult<()> {
        self.remote.verify_credential(credential).await
    }

    fn begin_cycle(&self) -> SyncResult<CycleGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::Busy);
        }
        Ok(CycleGuard {
            flag: &self.in_flight,
        })
    }

    fn mark_synced(&self) {
        *self.last_sync_at.write() = Some(Instant::now());
    }

    async fn push_inner(&self, credential: &Credential) -> SyncResult<PushOutcome> {
        // Snapshot the dirty set up front: collections dirtied while
        // the network call is in flight must keep their flag.
        let dirty = self.log.dirty();
        if dirty.is_empty() {
            debug!("no pending operations, skipping push");
            return Ok(PushOutcome { pushed: false });
        }

        let mut bundle = CollectionBundle::new();
        for name in &dirty {
            bundle.insert(*name, local::read_records(self.store.as_ref(), *name)?);
        }

        self.remote.push(credential, &bundle).await?;

        self.log.clear(&dirty);
        self.mark_synced();
        info!(
            collections = dirty.len(),
            records = bundle.record_count(),
            "pushed local changes"
        );
        Ok(PushOutcome { pushed: true })
    }

    async fn pull_inner(&self, credential: &Credential) -> SyncResult<Option<CollectionBundle>> {
        let Some(remote_bundle) = self.remote.pull(credential).await? else {
            debug!("remote has no backup yet");
            self.mark_synced();
            return Ok(None);
        };

        let mut merged = CollectionBundle::new();
        for name in CollectionName::ALL {
            let remote_records = remote_bundle.records(name).to_vec();
            let remote_won = !remote_records.is_empty();
            let local_records = local::read_records(self.store.as_ref(), name)?;

            let winner = merge::merge_collection(remote_records, local_records);
            if remote_won {
                local::write_records(self.store.as_ref(), name, &winner)?;
            }
            if !winner.is_empty() {
                merged.insert(name, winner);
            }
        }

        self.mark_synced();
        info!(
            collections = merged.len(),
            records = merged.record_count(),
            "pulled and merged remote snapshot"
        );
        Ok(Some(merged))
    }
}

/// Releases the in-flight flag when a cycle ends, success or failure.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
