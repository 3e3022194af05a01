//! Execution-scoped stores
//!
//! Request-scoped data without threading it through every signature.
//!
//! - `ThreadScope`: one `LocalStore` per OS thread, created lazily on first
//!   touch, released by `clear()` or a `ScopeGuard`.
//! - `TaskScope`: one `LocalStore` per tokio task, for the duration of
//!   `TaskScope::run`. Tasks spawned inside a scope get no store of their own.
//!
//! Thread scopes outlive the unit of work when threads are recycled, so the
//! worker must clear on every exit path; `ThreadScope::enter()` returns a
//! guard that does it on drop, unwinding included.

use std::cell::Cell;
use std::future::Future;
use std::marker::PhantomData;

use crate::error::StoreError;
use crate::store::{KeyValueStore, LocalStore};
use crate::value::StoredValue;

thread_local! {
    static THREAD_STORE: LocalStore = LocalStore::new();
    /// Live `ScopeGuard`s on this thread
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

tokio::task_local! {
    static TASK_STORE: LocalStore;
}

// ============================================================================
// THREAD SCOPE
// ============================================================================

/// Handle onto the current thread's store
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScope;

impl ThreadScope {
    /// Start a unit of work; the returned guard clears the store when dropped
    ///
    /// Guards nest: only the outermost one clears, so a helper that enters
    /// its own scope leaves the caller's entries in place.
    pub fn enter() -> ScopeGuard {
        SCOPE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        ScopeGuard {
            _not_send: PhantomData,
        }
    }

    /// Discard the current thread's entries. Other threads are unaffected.
    pub fn clear(&self) {
        // Fails only while the thread itself is being torn down
        let _ = THREAD_STORE.try_with(LocalStore::clear);
    }

    /// Number of entries in the current thread's store
    pub fn len(&self) -> usize {
        THREAD_STORE.with(LocalStore::len)
    }

    pub fn is_empty(&self) -> bool {
        THREAD_STORE.with(LocalStore::is_empty)
    }
}

impl KeyValueStore for ThreadScope {
    fn store_name(&self) -> &'static str {
        "ThreadScope"
    }

    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError> {
        THREAD_STORE.with(|store| store.put(key, value))
    }

    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        THREAD_STORE.with(|store| store.lookup(key))
    }

    fn has(&self, key: &str) -> bool {
        THREAD_STORE.with(|store| store.has(key))
    }
}

/// Clears the thread store when the outermost guard drops. Bound to the
/// thread that created it.
#[must_use = "the thread store is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let remaining = SCOPE_DEPTH
            .try_with(|depth| {
                let remaining = depth.get().saturating_sub(1);
                depth.set(remaining);
                remaining
            })
            .unwrap_or(0);
        if remaining == 0 {
            ThreadScope.clear();
        }
    }
}

// ============================================================================
// TASK SCOPE
// ============================================================================

/// Handle onto the current tokio task's store
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskScope;

impl TaskScope {
    /// Run `future` with a fresh store. The store is dropped when the future
    /// completes or is cancelled.
    pub async fn run<F: Future>(future: F) -> F::Output {
        TASK_STORE.scope(LocalStore::new(), future).await
    }

    /// True inside `TaskScope::run`
    pub fn is_active() -> bool {
        TASK_STORE.try_with(|_| ()).is_ok()
    }

    /// Discard the current task's entries
    pub fn clear(&self) -> Result<(), StoreError> {
        TASK_STORE
            .try_with(LocalStore::clear)
            .map_err(|_| StoreError::NoActiveScope)
    }

    /// Number of entries in the current task's store
    pub fn len(&self) -> Result<usize, StoreError> {
        TASK_STORE
            .try_with(LocalStore::len)
            .map_err(|_| StoreError::NoActiveScope)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}

impl KeyValueStore for TaskScope {
    fn store_name(&self) -> &'static str {
        "TaskScope"
    }

    fn put(&self, key: String, value: StoredValue) -> Result<(), StoreError> {
        TASK_STORE
            .try_with(|store| store.put(key, value))
            .unwrap_or(Err(StoreError::NoActiveScope))
    }

    fn lookup(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        TASK_STORE
            .try_with(|store| store.lookup(key))
            .unwrap_or(Err(StoreError::NoActiveScope))
    }

    fn has(&self, key: &str) -> bool {
        TASK_STORE.try_with(|store| store.has(key)).unwrap_or(false)
    }
}
