//! File-backed store.

use crate::error::{StoreError, StoreResult};
use crate::store::LocalStore;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

type Namespace = BTreeMap<String, String>;

/// A durable [`LocalStore`] backed by a directory of JSON files.
///
/// Each namespace is persisted as `<root>/<namespace>.json` holding a
/// flat key → value map. Writes go through an in-memory cache and are
/// flushed with a write-then-rename so a crash mid-write never leaves a
/// truncated file behind.
pub struct JsonFileStore {
    root: PathBuf,
    cache: Mutex<BTreeMap<String, Namespace>>,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self {
            root,
            cache: Mutex::new(BTreeMap::new()),
        })
    }

    /// Returns the root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_path(&self, collection: &str) -> StoreResult<PathBuf> {
        // Namespaces become file names; anything that could escape the
        // root directory is rejected.
        if collection.is_empty()
            || collection.contains(['/', '\\'])
            || collection == "."
            || collection == ".."
        {
            return Err(StoreError::InvalidKey(collection.to_string()));
        }
        Ok(self.root.join(format!("{collection}.json")))
    }

    fn load_namespace(&self, collection: &str) -> StoreResult<Namespace> {
        let path = self.namespace_path(collection)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Namespace::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn flush_namespace(&self, collection: &str, namespace: &Namespace) -> StoreResult<()> {
        let path = self.namespace_path(collection)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(namespace)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Loads the namespace into the cache if absent, then hands a
    /// mutable reference to `f`. Returns `f`'s result.
    fn with_namespace<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Namespace) -> T,
    ) -> StoreResult<T> {
        let mut cache = self.cache.lock();
        if !cache.contains_key(collection) {
            let loaded = self.load_namespace(collection)?;
            cache.insert(collection.to_string(), loaded);
        }
        let namespace = cache.get_mut(collection).expect("namespace just inserted");
        Ok(f(namespace))
    }
}

impl LocalStore for JsonFileStore {
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<String>> {
        self.with_namespace(collection, |ns| ns.get(key).cloned())
    }

    fn set(&self, collection: &str, key: &str, value: &str) -> StoreResult<()> {
        let snapshot = self.with_namespace(collection, |ns| {
            ns.insert(key.to_string(), value.to_string());
            ns.clone()
        })?;
        self.flush_namespace(collection, &snapshot)
    }

    fn remove(&self, collection: &str, key: &str) -> StoreResult<()> {
        let snapshot = self.with_namespace(collection, |ns| {
            ns.remove(key).is_some().then(|| ns.clone())
        })?;
        match snapshot {
            Some(snapshot) => self.flush_namespace(collection, &snapshot),
            None => Ok(()),
        }
    }
}
