//! The schedule coordinator.
//!
//! Converts five independent triggers (mount, debounced local change,
//! periodic push, periodic pull, reconnect) into serialized calls on
//! the [`SyncEngine`], and broadcasts merged pull results to UI
//! subscribers. It holds no business data of its own.

use crate::config::ScheduleConfig;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::status::SyncStatus;
use larder_model::{CollectionBundle, Credential};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Broadcasts merged bundles to UI subscribers after successful pulls.
///
/// Subscribers that fall away are pruned on the next emit.
#[derive(Debug, Default)]
pub struct PulledFeed {
    subscribers: RwLock<Vec<UnboundedSender<CollectionBundle>>>,
}

impl PulledFeed {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to merged bundles from future pulls.
    pub fn subscribe(&self) -> UnboundedReceiver<CollectionBundle> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn emit(&self, bundle: CollectionBundle) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(bundle.clone()).is_ok());
    }
}

/// Drives the sync engine from timers, change signals, credential
/// lifecycle, and connectivity transitions.
///
/// All triggers are disarmed while no usable credential is present, and
/// suspended outright after an authentication failure until the
/// credential changes; retrying on a fixed interval against a token
/// known to be bad helps nobody.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    config: ScheduleConfig,
    credentials: watch::Receiver<Option<Credential>>,
    connectivity: watch::Receiver<bool>,
    changes: UnboundedReceiver<()>,
    pulled: Arc<PulledFeed>,
    suspended: bool,
}

impl SyncScheduler {
    /// Creates a scheduler over the engine. Subscribes to the engine's
    /// mutation log for "data changed" signals.
    pub fn new(
        engine: Arc<SyncEngine>,
        config: ScheduleConfig,
        credentials: watch::Receiver<Option<Credential>>,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        let changes = engine.mutation_log().subscribe();
        Self {
            engine,
            config,
            credentials,
            connectivity,
            changes,
            pulled: Arc::new(PulledFeed::new()),
            suspended: false,
        }
    }

    /// Handle to the pulled-bundle feed; clone before calling
    /// [`SyncScheduler::run`].
    pub fn pulled_feed(&self) -> Arc<PulledFeed> {
        Arc::clone(&self.pulled)
    }

    /// Snapshot of the engine's sync state for status displays.
    pub fn status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Runs the trigger loop until the credential channel closes.
    pub async fn run(mut self) {
        let mut push_tick = time::interval_at(
            Instant::now() + self.config.push_interval,
            self.config.push_interval,
        );
        push_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pull_tick = time::interval_at(
            Instant::now() + self.config.pull_interval,
            self.config.pull_interval,
        );
        pull_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut debounce_deadline: Option<Instant> = None;
        let mut connectivity_closed = false;

        // Mount trigger: a credential already present at startup syncs
        // once before any timer fires.
        if let Some(credential) = self.armed_credential() {
            info!(user = %credential.user_email, "credential present at start, running initial sync");
            self.run_sync(&credential).await;
        }

        loop {
            // Placeholder target keeps the sleep constructible when no
            // debounce is armed; the branch guard keeps it unpolled.
            let debounce_target = debounce_deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                changed = self.credentials.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let credential = self.credentials.borrow_and_update().clone();
                    self.suspended = false;
                    debounce_deadline = None;
                    match credential.filter(Credential::is_usable) {
                        Some(credential) => {
                            info!(user = %credential.user_email, "credential available, running initial sync");
                            self.run_sync(&credential).await;
                        }
                        None => info!("credential cleared, sync triggers disarmed"),
                    }
                }

                changed = self.changes.recv() => {
                    match changed {
                        Some(()) => {
                            // Every edit restarts the window, so a burst
                            // collapses into one push after it settles.
                            if self.armed() {
                                debounce_deadline =
                                    Some(Instant::now() + self.config.debounce);
                            }
                        }
                        None => break,
                    }
                }

                _ = time::sleep_until(debounce_target), if debounce_deadline.is_some() => {
                    debounce_deadline = None;
                    if let Some(credential) = self.armed_credential() {
                        debug!("debounce window elapsed, pushing");
                        self.run_push(&credential).await;
                    }
                }

                _ = push_tick.tick() => {
                    if let Some(credential) = self.armed_credential() {
                        if self.engine.status().pending > 0 {
                            debug!("periodic push safety net firing");
                            self.run_push(&credential).await;
                        }
                    }
                }

                _ = pull_tick.tick() => {
                    if let Some(credential) = self.armed_credential() {
                        debug!("periodic pull firing");
                        self.run_pull(&credential).await;
                    }
                }

                changed = self.connectivity.changed(), if !connectivity_closed => {
                    match changed {
                        Ok(()) => {
                            let online = *self.connectivity.borrow_and_update();
                            if online {
                                if let Some(credential) = self.armed_credential() {
                                    info!("connection restored, pushing pending changes");
                                    self.run_push(&credential).await;
                                }
                            }
                        }
                        Err(_) => connectivity_closed = true,
                    }
                }
            }
        }

        info!("schedule coordinator stopped");
    }

    fn armed(&self) -> bool {
        !self.suspended
            && self
                .credentials
                .borrow()
                .as_ref()
                .is_some_and(Credential::is_usable)
    }

    fn armed_credential(&self) -> Option<Credential> {
        if self.suspended {
            return None;
        }
        self.credentials
            .borrow()
            .clone()
            .filter(Credential::is_usable)
    }

    async fn run_sync(&mut self, credential: &Credential) {
        match self.engine.sync(credential).await {
            Ok(outcome) => {
                debug!(
                    pushed = outcome.pushed,
                    pulled = outcome.pulled.is_some(),
                    "sync cycle complete"
                );
                if let Some(bundle) = outcome.pulled {
                    self.broadcast_pulled(credential, bundle);
                }
            }
            Err(err) => self.handle_cycle_error("sync", err),
        }
    }

    async fn run_push(&mut self, credential: &Credential) {
        match self.engine.push(credential).await {
            Ok(outcome) => debug!(pushed = outcome.pushed, "push cycle complete"),
            Err(err) => self.handle_cycle_error("push", err),
        }
    }

    async fn run_pull(&mut self, credential: &Credential) {
        match self.engine.pull(credential).await {
            Ok(Some(bundle)) => self.broadcast_pulled(credential, bundle),
            Ok(None) => debug!("pull cycle complete, remote has no backup"),
            Err(err) => self.handle_cycle_error("pull", err),
        }
    }

    /// Logout is the only cancellation point, and it never aborts an
    /// in-flight network call: the cycle completes and its result is
    /// discarded here if the credential that started it is gone.
    fn broadcast_pulled(&self, used: &Credential, bundle: CollectionBundle) {
        if self.credentials.borrow().as_ref() != Some(used) {
            warn!("credential changed mid-cycle, discarding pulled data");
            return;
        }
        self.pulled.emit(bundle);
    }

    fn handle_cycle_error(&mut self, operation: &'static str, err: SyncError) {
        match err {
            SyncError::Busy => {
                // Dropped, not queued: the next periodic tick or
                // debounce retries.
                debug!(operation, "cycle already in flight, trigger dropped");
            }
            SyncError::Auth(message) => {
                warn!(
                    operation,
                    error = %message,
                    "authentication failed, suspending sync until credential changes"
                );
                self.suspended = true;
            }
            err => {
                warn!(operation, error = %err, "cycle failed, will retry on next trigger");
            }
        }
    }
}
