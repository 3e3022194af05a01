//! Typed key tokens
//!
//! A `Key<T>` pairs a string key with the type stored under it, so reads
//! through the token are checked at compile time instead of at the call site.
//!
//! ```
//! use ctxstore::{Key, KeyValueStore, SharedStore};
//!
//! const RETRIES: Key<u32> = Key::new("http.retries");
//!
//! let store = SharedStore::new();
//! store.set_key(&RETRIES, 3).unwrap();
//! assert_eq!(*store.get_key(&RETRIES).unwrap(), 3);
//! ```

use std::fmt;
use std::marker::PhantomData;

pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

// Manual impls: derives would demand `T: Clone` etc.
impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key<{}>({})", std::any::type_name::<T>(), self.name)
    }
}

impl<T> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
