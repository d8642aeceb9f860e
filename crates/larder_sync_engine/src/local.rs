//! Local-store boundary helpers.
//!
//! The local store holds JSON-encoded strings; parse and stringify
//! happen here, at the sync layer's edge. A collection's full record
//! array lives under [`RECORDS_KEY`] in the namespace named after the
//! collection.

use crate::error::SyncResult;
use larder_model::{CollectionBundle, CollectionName, Record};
use larder_store::{LocalStore, StoreError, RECORDS_KEY};

/// Reads a collection's records; an unset key reads as empty.
pub fn read_records(
    store: &dyn LocalStore,
    collection: CollectionName,
) -> SyncResult<Vec<Record>> {
    match store.get(collection.as_str(), RECORDS_KEY)? {
        None => Ok(Vec::new()),
        Some(raw) => Ok(serde_json::from_str(&raw).map_err(StoreError::Serde)?),
    }
}

/// Serializes and writes a collection's records, replacing what was
/// there.
pub fn write_records(
    store: &dyn LocalStore,
    collection: CollectionName,
    records: &[Record],
) -> SyncResult<()> {
    let raw = serde_json::to_string(records).map_err(StoreError::Serde)?;
    store.set(collection.as_str(), RECORDS_KEY, &raw)?;
    Ok(())
}

/// Reads every collection into a bundle, skipping empty ones.
pub fn read_all(store: &dyn LocalStore) -> SyncResult<CollectionBundle> {
    let mut bundle = CollectionBundle::new();
    for name in CollectionName::ALL {
        let records = read_records(store, name)?;
        if !records.is_empty() {
            bundle.insert(name, records);
        }
    }
    Ok(bundle)
}
