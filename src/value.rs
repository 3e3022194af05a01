//! Dynamic values held by every store
//!
//! A `StoredValue` is a shared `Any` handle plus the concrete type name it
//! was created from, so a failed downcast can report what was actually there.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased value (cloning is an Arc clone)
#[derive(Clone)]
pub struct StoredValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl StoredValue {
    /// Wrap an owned value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap a value that is already shared, keeping its identity
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// Name of the concrete type this value was stored as
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check the runtime type without taking a handle
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a typed handle to the same allocation
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// True if both handles point at the same stored value
    pub fn ptr_eq(&self, other: &StoredValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
