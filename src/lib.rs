//! ctxstore - config, shared and execution-scoped key/value stores
//!
//! All stores share one contract ([`KeyValueStore`]): a key is read only
//! after something upstream gave it a value, so `get` on a missing key fails
//! instead of returning an empty placeholder, and `get_typed` additionally
//! fails when the stored value has a different type.

pub mod error;
pub mod global;
pub mod key;
pub mod pool;
pub mod scope;
pub mod seed;
pub mod simulate;
pub mod store;
pub mod value;

pub use error::{FixSuggestion, StoreError};
pub use key::Key;
pub use pool::{Lease, LocalStorePool};
pub use scope::{ScopeGuard, TaskScope, ThreadScope};
pub use store::{ConfigStore, KeyValueStore, LocalStore, SharedStore};
pub use value::StoredValue;
