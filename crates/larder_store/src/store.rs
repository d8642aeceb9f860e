//! The local store capability.

use crate::error::StoreResult;

/// Key under which a collection's full record array is stored, inside
/// the namespace named after the collection.
pub const RECORDS_KEY: &str = "records";

/// Reserved namespace for sync bookkeeping (cached remote folder/file
/// ids and similar). Never contains domain records.
pub const SYNC_NAMESPACE: &str = "__sync";

/// Device-resident durable key-value persistence, keyed by logical
/// collection name.
///
/// This is the boundary the sync engine consumes; the UI/CRUD layer
/// owns the record bodies behind it. Values are JSON-encoded strings
/// and callers perform parse/stringify at their own boundary.
pub trait LocalStore: Send + Sync {
    /// Reads a value, or `None` if the key was never set.
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, collection: &str, key: &str, value: &str) -> StoreResult<()>;

    /// Removes a value. Removing an absent key is not an error.
    fn remove(&self, collection: &str, key: &str) -> StoreResult<()>;
}
