//! Mutation tracking and the "data changed" signal.
//!
//! The mutation log answers "how many pending operations exist" without
//! re-diffing entire collections, and fans a payload-free change signal
//! out to subscribers (the schedule coordinator debounces it into a
//! push).

use larder_model::CollectionName;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Per-collection dirty tracking for unflushed local changes.
///
/// Deliberately coarse: a collection either has unflushed changes or it
/// does not, and a push retransmits the whole collection. The log is
/// ephemeral and rebuilt each session.
///
/// # Usage
///
/// ```rust
/// use larder_model::CollectionName;
/// use larder_store::MutationLog;
///
/// let log = MutationLog::new();
/// let mut changes = log.subscribe();
///
/// log.mark_dirty(CollectionName::Recipes);
/// assert_eq!(log.pending_count(), 1);
/// assert!(changes.try_recv().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct MutationLog {
    dirty: RwLock<BTreeSet<CollectionName>>,
    subscribers: RwLock<Vec<UnboundedSender<()>>>,
}

impl MutationLog {
    /// Creates a new empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a collection has unflushed local changes and emits
    /// one change signal per call, dirty or not: the signal tracks
    /// edits, the flag tracks state.
    pub fn mark_dirty(&self, collection: CollectionName) {
        self.dirty.write().insert(collection);
        trace!(%collection, "collection marked dirty");

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(()).is_ok());
    }

    /// Returns true if the collection has unflushed changes.
    pub fn is_dirty(&self, collection: CollectionName) -> bool {
        self.dirty.read().contains(&collection)
    }

    /// Snapshot of every dirty collection, in wire order.
    pub fn dirty(&self) -> Vec<CollectionName> {
        self.dirty.read().iter().copied().collect()
    }

    /// Number of collections awaiting a push.
    pub fn pending_count(&self) -> usize {
        self.dirty.read().len()
    }

    /// Clears the flags for exactly the given collections.
    ///
    /// Called after a successful push with the snapshot that was sent;
    /// collections dirtied mid-push keep their flag.
    pub fn clear(&self, collections: &[CollectionName]) {
        let mut dirty = self.dirty.write();
        for collection in collections {
            dirty.remove(collection);
        }
    }

    /// Subscribes to the payload-free "data changed" signal.
    pub fn subscribe(&self) -> UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_flags_accumulate_without_duplicates() {
        let log = MutationLog::new();
        assert_eq!(log.pending_count(), 0);

        log.mark_dirty(CollectionName::Recipes);
        log.mark_dirty(CollectionName::Recipes);
        log.mark_dirty(CollectionName::Orders);

        assert_eq!(log.pending_count(), 2);
        assert!(log.is_dirty(CollectionName::Recipes));
        assert!(!log.is_dirty(CollectionName::Inventory));
    }

    #[test]
    fn clear_removes_only_named_collections() {
        let log = MutationLog::new();
        log.mark_dirty(CollectionName::Recipes);
        log.mark_dirty(CollectionName::Orders);

        log.clear(&[CollectionName::Recipes]);

        assert_eq!(log.pending_count(), 1);
        assert!(log.is_dirty(CollectionName::Orders));
    }

    #[test]
    fn every_edit_emits_a_signal() {
        let log = MutationLog::new();
        let mut changes = log.subscribe();

        // Marking an already-dirty collection still signals: the
        // debounce window restarts on every edit.
        log.mark_dirty(CollectionName::Recipes);
        log.mark_dirty(CollectionName::Recipes);

        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let log = MutationLog::new();
        let rx = log.subscribe();
        assert_eq!(log.subscriber_count(), 1);

        drop(rx);
        log.mark_dirty(CollectionName::Recipes);
        assert_eq!(log.subscriber_count(), 0);
    }
}
