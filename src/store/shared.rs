//! SharedStore - process-wide mutable state
//!
//! Single map design with lock-free concurrent access. Same contract as
//! `ConfigStore` without the freeze; pick this one for state that is meant
//! to change while the process runs.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::KeyValueStore;
use crate::error::StoreError;
use crate::value::StoredValue;

/// Thread-safe mutable storage (lock-free)
#[derive(Clone, Default)]
pub struct SharedStore {
    /// Entries: key → value
    entries: Arc<DashMap<String, StoredValue>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a key, returning what was bound to it
    pub fn remove(&self, key: &str) -> Option<StoredValue> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        // Values are dropped after every shard lock is released, so a Drop
        // impl may touch this store again.
        let dropped: Vec<(String, StoredValue)> =
            keys.iter().filter_map(|key| self.entries.remove(key)).collect();
        debug!(entries = dropped.len(), "clearing shared store");
    }
}

impl KeyValueStore for SharedStore {
    fn store_name(&self) -> &'static str {
        "SharedStore"
    }

    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError> {
        // `insert` hands the old value back after releasing its shard
        let previous = self.entries.insert(key, value);
        drop(previous);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
