//! Sync status snapshots.

use std::time::Duration;

/// A point-in-time view of the sync state, safe to read at any moment,
/// including mid-cycle.
///
/// The UI layer derives everything it shows from this snapshot; raw
/// errors are never surfaced. Failures manifest only as a pending count
/// that stays non-zero longer than expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// Time since the last successful cycle, or `None` if this session
    /// has never synced.
    pub last_sync_ago: Option<Duration>,
    /// Number of collections awaiting a push.
    pub pending: usize,
    /// Whether a cycle is currently in flight.
    pub is_syncing: bool,
}

impl SyncStatus {
    /// Milliseconds since the last successful cycle, `-1` for "never
    /// synced" (the wire convention consumed by status displays).
    pub fn last_sync_ago_ms(&self) -> i64 {
        self.last_sync_ago
            .map(|ago| ago.as_millis() as i64)
            .unwrap_or(-1)
    }

    /// Returns true if at least one cycle has completed this session.
    pub fn has_synced(&self) -> bool {
        self.last_sync_ago.is_some()
    }
}
