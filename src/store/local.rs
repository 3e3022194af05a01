//! LocalStore - the mapping owned by one execution context
//!
//! Not `Sync`: a `LocalStore` can move between threads but can never be
//! reached from two threads at once. `ThreadScope`, `TaskScope` and the
//! store pool hand one out per unit of work.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use super::KeyValueStore;
use crate::error::StoreError;
use crate::value::StoredValue;

#[derive(Debug, Default)]
pub struct LocalStore {
    entries: RefCell<HashMap<String, StoredValue>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every entry
    pub fn clear(&self) {
        // Values are dropped after the borrow ends, so a Drop impl may
        // touch this store again.
        let dropped = std::mem::take(&mut *self.entries.borrow_mut());
        if !dropped.is_empty() {
            debug!(entries = dropped.len(), "clearing local store");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for LocalStore {
    fn store_name(&self) -> &'static str {
        "LocalStore"
    }

    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError> {
        let previous = self.entries.borrow_mut().insert(key, value);
        drop(previous);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}
