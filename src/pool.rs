//! Pool of reusable LocalStores for worker pools
//!
//! A worker takes a store per unit of work and gives it back when done.
//! Stores are cleared on the way back in, so nothing from one unit of work
//! is visible to the next one that reuses the same store.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::LocalStore;

/// Recycled `LocalStore`s shared by a set of workers
pub struct LocalStorePool {
    /// Idle stores, all empty
    pool: Mutex<Vec<LocalStore>>,
    /// Idle stores beyond this are discarded on release
    max_size: usize,
}

impl LocalStorePool {
    /// Pool keeping up to eight idle stores
    pub fn new() -> Self {
        Self::with_capacity(8)
    }

    /// Pool keeping up to `max_size` idle stores
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            pool: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
        }
    }

    // Every pooled store is already empty, so a poisoned lock is still usable
    fn slots(&self) -> MutexGuard<'_, Vec<LocalStore>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take an idle store, or a fresh one when none is idle
    pub fn acquire(&self) -> LocalStore {
        self.slots().pop().unwrap_or_default()
    }

    /// Hand a store back after a unit of work
    ///
    /// Its entries are dropped first, whether or not the pool keeps it.
    pub fn release(&self, store: LocalStore) {
        store.clear();

        let mut pool = self.slots();
        // A full pool discards the surplus store
        if pool.len() < self.max_size {
            pool.push(store);
        }
    }

    /// Borrow a store that goes back to the pool when the lease is dropped
    pub fn lease(&self) -> Lease<'_> {
        Lease {
            pool: self,
            store: Some(self.acquire()),
        }
    }

    /// Idle stores currently held
    pub fn size(&self) -> usize {
        self.slots().len()
    }

    /// Discard every idle store
    pub fn drain(&self) {
        self.slots().clear();
    }

    /// Fill the pool with up to `count` empty stores, never past `max_size`
    pub fn warm(&self, count: usize) {
        let mut pool = self.slots();
        let to_add = self.max_size.saturating_sub(pool.len()).min(count);

        for _ in 0..to_add {
            pool.push(LocalStore::new());
        }
    }
}

impl Default for LocalStorePool {
    fn default() -> Self {
        Self::new()
    }
}

/// A pooled store, released on drop (including during unwinding)
pub struct Lease<'a> {
    pool: &'a LocalStorePool,
    store: Option<LocalStore>,
}

impl Deref for Lease<'_> {
    type Target = LocalStore;

    fn deref(&self) -> &LocalStore {
        // Only `drop` takes the store out
        self.store.as_ref().unwrap_or_else(|| unreachable!("lease used after release"))
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            self.pool.release(store);
        }
    }
}

/// Pool used by the free functions below
static GLOBAL_POOL: once_cell::sync::Lazy<LocalStorePool> =
    once_cell::sync::Lazy::new(|| LocalStorePool::with_capacity(16));

/// Take a store from the process-wide pool
pub fn acquire() -> LocalStore {
    GLOBAL_POOL.acquire()
}

/// Hand a store back to the process-wide pool
pub fn release(store: LocalStore) {
    GLOBAL_POOL.release(store);
}

/// Lease a store from the process-wide pool
pub fn lease() -> Lease<'static> {
    GLOBAL_POOL.lease()
}

/// Fill the process-wide pool with empty stores
pub fn warm(count: usize) {
    GLOBAL_POOL.warm(count);
}
