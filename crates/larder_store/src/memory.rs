//! In-memory store for testing.

use crate::error::StoreResult;
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory [`LocalStore`].
///
/// Suitable for unit tests, integration tests, and ephemeral sessions
/// that do not need persistence.
///
/// # Example
///
/// ```rust
/// use larder_store::{LocalStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("recipes", "records", "[]").unwrap();
/// assert_eq!(store.get("recipes", "records").unwrap().as_deref(), Some("[]"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .read()
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&self, collection: &str, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .insert((collection.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.entries
            .write()
            .remove(&(collection.to_string(), key.to_string()));
        Ok(())
    }
}
