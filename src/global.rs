//! Process-wide stores
//!
//! For code that cannot be handed a store by its owner. Both are created on
//! first use and live until the process exits. Prefer constructing a
//! `ConfigStore`/`SharedStore` at startup and passing it down.

use once_cell::sync::Lazy;

use crate::store::{ConfigStore, SharedStore};

static CONFIG: Lazy<ConfigStore> = Lazy::new(ConfigStore::new);
static SHARED: Lazy<SharedStore> = Lazy::new(SharedStore::new);

/// The process-wide configuration store
pub fn config() -> &'static ConfigStore {
    &CONFIG
}

/// The process-wide mutable store
pub fn shared() -> &'static SharedStore {
    &SHARED
}
