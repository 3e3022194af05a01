//! ConfigStore - write at boot, read everywhere
//!
//! Populate every key during startup, then `freeze()` once. A frozen store
//! rejects overwrites of existing keys; keys that were never set can still
//! be added.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use super::KeyValueStore;
use crate::error::StoreError;
use crate::value::StoredValue;

/// Thread-safe configuration storage with an optional freeze
///
/// Clones share the same entries and the same freeze flag.
#[derive(Clone, Default)]
pub struct ConfigStore {
    /// Configuration entries: key → value
    entries: Arc<DashMap<String, StoredValue>>,
    immutable: Arc<AtomicBool>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the freeze flag
    pub fn set_immutable(&self, immutable: bool) {
        let previous = self.immutable.swap(immutable, Ordering::SeqCst);
        if previous != immutable {
            info!(immutable, entries = self.entries.len(), "configuration freeze changed");
        }
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable.load(Ordering::SeqCst)
    }

    /// Lock existing keys against overwrites
    pub fn freeze(&self) {
        self.set_immutable(true);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the bound keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for ConfigStore {
    fn store_name(&self) -> &'static str {
        "ConfigStore"
    }

    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError> {
        // Check and write under the same shard lock
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                if self.is_immutable() {
                    warn!(key = %slot.key(), "rejected overwrite of frozen configuration");
                    return Err(StoreError::ImmutableConfig {
                        key: slot.key().clone(),
                    });
                }
                // Release the shard before the old value's Drop can run
                let previous = slot.insert(value);
                drop(slot);
                drop(previous);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_allowed_before_freeze() {
        let store = ConfigStore::new();
        assert!(!store.is_immutable());

        store.set("mode", "dev").unwrap();
        store.set("mode", "prod").unwrap();
        assert_eq!(*store.get_typed::<&'static str>("mode").unwrap(), "prod");
    }

    #[test]
    fn freeze_rejects_overwrite_and_keeps_old_value() {
        let store = ConfigStore::new();
        store.set("db.port", 5432_i64).unwrap();
        store.freeze();
        assert!(store.is_immutable());

        let err = store.set("db.port", 5433_i64).unwrap_err();
        assert_eq!(err, StoreError::ImmutableConfig { key: "db.port".into() });
        assert_eq!(*store.get_typed::<i64>("db.port").unwrap(), 5432);
    }

    #[test]
    fn freeze_still_allows_new_keys() {
        let store = ConfigStore::new();
        store.freeze();

        store.set("late.key", true).unwrap();
        assert!(store.has("late.key"));
        // ...but once added it is locked like the rest
        assert!(store.set("late.key", false).is_err());
    }

    #[test]
    fn unfreeze_reallows_overwrites() {
        let store = ConfigStore::new();
        store.set("k", 1_u8).unwrap();
        store.set_immutable(true);
        assert!(store.set("k", 2_u8).is_err());

        store.set_immutable(false);
        store.set("k", 3_u8).unwrap();
        assert_eq!(*store.get_typed::<u8>("k").unwrap(), 3);
    }

    #[test]
    fn clones_share_entries_and_flag() {
        let store = ConfigStore::new();
        let handle = store.clone();

        store.set("shared", 1_i32).unwrap();
        assert!(handle.has("shared"));

        handle.freeze();
        assert!(store.is_immutable());
    }

    /// Reads its own store when dropped
    struct Touch(ConfigStore);

    impl Drop for Touch {
        fn drop(&mut self) {
            let _ = self.0.has("k");
        }
    }

    #[test]
    fn overwrite_lets_old_value_read_the_store() {
        let store = ConfigStore::new();
        store.set("k", Touch(store.clone())).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let writer = store.clone();
        std::thread::spawn(move || {
            let _ = tx.send(writer.set("k", 1_u8));
        });

        let result = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("overwrite blocked while dropping the old value");
        assert!(result.is_ok());
        assert_eq!(*store.get_typed::<u8>("k").unwrap(), 1);
    }

    #[test]
    fn keys_are_sorted() {
        let store = ConfigStore::new();
        store.set("b", 2).unwrap();
        store.set("a", 1).unwrap();
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }
}
