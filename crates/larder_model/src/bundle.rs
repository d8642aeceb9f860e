//! Collection bundles, the unit of transfer.

use crate::collection::{CollectionName, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set of collections exchanged in one push or pull.
///
/// A bundle may be partial: a push carries only the collections with
/// unflushed local changes, while a pull result carries whatever the
/// remote holds. An absent collection and an empty collection are
/// interchangeable on read ([`CollectionBundle::records`] returns an
/// empty slice for both).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionBundle {
    collections: BTreeMap<CollectionName, Vec<Record>>,
}

impl CollectionBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a collection's records.
    pub fn insert(&mut self, name: CollectionName, records: Vec<Record>) {
        self.collections.insert(name, records);
    }

    /// Returns a collection's records, or an empty slice if absent.
    pub fn records(&self, name: CollectionName) -> &[Record] {
        self.collections.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the bundle names the collection, even with no records.
    pub fn contains(&self, name: CollectionName) -> bool {
        self.collections.contains_key(&name)
    }

    /// Number of collections carried by the bundle.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if the bundle carries no collections at all.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Iterates over the carried collections in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (CollectionName, &[Record])> {
        self.collections.iter().map(|(name, records)| (*name, records.as_slice()))
    }
}
