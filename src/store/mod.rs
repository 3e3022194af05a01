//! Store Module - key/value stores with fail-fast typed reads
//!
//! Every store maps `String` keys to [`StoredValue`]s and shares one contract
//! ([`KeyValueStore`]): set, has, get (fails on a missing key) and get_typed
//! (also fails on a type mismatch).
//!
//! Key types:
//! - `ConfigStore`: process-wide configuration, freezable after boot
//! - `SharedStore`: process-wide mutable state
//! - `LocalStore`: one mapping per execution context (see `crate::scope`)

mod config;
mod local;
mod shared;

use std::any::{type_name, Any};
use std::sync::Arc;

use tracing::debug;

use crate::error::StoreError;
use crate::key::Key;
use crate::value::StoredValue;

// Re-export all public types
pub use config::ConfigStore;
pub use local::LocalStore;
pub use shared::SharedStore;

/// Contract shared by every store variant
pub trait KeyValueStore {
    /// Name used in error messages
    fn store_name(&self) -> &'static str;

    /// Bind `key` to `value`, replacing any previous binding
    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError>;

    /// Raw lookup. Only scoped stores with no active scope fail here.
    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// True iff `key` is bound. Never fails.
    fn has(&self, key: &str) -> bool;

    /// Store an owned value under `key`
    fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) -> Result<(), StoreError> {
        self.set_value(key, StoredValue::new(value))
    }

    /// Store an already wrapped value (keeps its identity)
    fn set_value(&self, key: impl Into<String>, value: StoredValue) -> Result<(), StoreError> {
        let key = key.into();
        debug!(store = self.store_name(), key = %key, value_type = value.type_name(), "set");
        self.put(key, value)
    }

    /// Non-failing lookup
    fn try_get(&self, key: &str) -> Option<StoredValue> {
        self.lookup(key).ok().flatten()
    }

    /// Fail-fast lookup: a missing key is a defect upstream
    fn get(&self, key: &str) -> Result<StoredValue, StoreError> {
        self.lookup(key)?
            .ok_or_else(|| StoreError::missing(key, self.store_name()))
    }

    /// Fail-fast lookup narrowed to `T`
    fn get_typed<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, StoreError> {
        let value = self.get(key)?;
        value.downcast::<T>().ok_or_else(|| StoreError::TypeMismatch {
            key: key.to_string(),
            actual: value.type_name(),
            expected: type_name::<T>(),
        })
    }

    /// `get_typed` followed by a clone out of the shared handle
    fn get_cloned<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, StoreError> {
        self.get_typed::<T>(key).map(|v| (*v).clone())
    }

    /// Typed-token variant of `set`
    fn set_key<T: Any + Send + Sync>(&self, key: &Key<T>, value: T) -> Result<(), StoreError> {
        self.set(key.name(), value)
    }

    /// Typed-token variant of `get_typed`
    fn get_key<T: Any + Send + Sync>(&self, key: &Key<T>) -> Result<Arc<T>, StoreError> {
        self.get_typed::<T>(key.name())
    }
}
