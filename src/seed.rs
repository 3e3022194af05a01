//! Command-line seeding of stores
//!
//! `KEY=VALUE` assignments and `KEY[:TYPE]` lookups used by the `ctxstore`
//! binary. Values are stored with a concrete Rust type so typed reads behave
//! the same as for values set from code:
//!
//! | Input | Stored as |
//! |---|---|
//! | `5432` | `i64` |
//! | `0.5` | `f64` |
//! | `true` / `false` | `bool` |
//! | anything else | `String` |

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::store::KeyValueStore;
use crate::value::StoredValue;

/// A parsed command-line value
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl SeedValue {
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return SeedValue::Int(i);
        }
        // "inf"/"nan" stay text
        if raw.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = raw.parse::<f64>() {
                return SeedValue::Float(f);
            }
        }
        match raw {
            "true" => SeedValue::Bool(true),
            "false" => SeedValue::Bool(false),
            _ => SeedValue::Text(raw.to_string()),
        }
    }

    pub fn into_stored(self) -> StoredValue {
        match self {
            SeedValue::Int(i) => StoredValue::new(i),
            SeedValue::Float(f) => StoredValue::new(f),
            SeedValue::Bool(b) => StoredValue::new(b),
            SeedValue::Text(s) => StoredValue::new(s),
        }
    }
}

/// `KEY=VALUE`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub value: SeedValue,
}

impl Assignment {
    pub fn apply<S: KeyValueStore>(self, store: &S) -> Result<(), StoreError> {
        store.set_value(self.key, self.value.into_stored())
    }
}

impl FromStr for Assignment {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidAssignment { input: s.to_string() };
        let (key, value) = s.split_once('=').ok_or_else(invalid)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            key: key.to_string(),
            value: SeedValue::parse(value),
        })
    }
}

/// Expected type of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeHint {
    Int,
    Float,
    Bool,
    Str,
    #[default]
    Any,
}

impl FromStr for TypeHint {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(TypeHint::Int),
            "float" => Ok(TypeHint::Float),
            "bool" => Ok(TypeHint::Bool),
            "str" => Ok(TypeHint::Str),
            "any" => Ok(TypeHint::Any),
            other => Err(StoreError::UnknownType { name: other.to_string() }),
        }
    }
}

/// `KEY` or `KEY:TYPE`; the type is taken after the last `:`
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub key: String,
    pub hint: TypeHint,
}

impl Lookup {
    /// Read the key with the requested type and render it for display
    pub fn read<S: KeyValueStore>(&self, store: &S) -> Result<String, StoreError> {
        let key = self.key.as_str();
        Ok(match self.hint {
            TypeHint::Int => store.get_typed::<i64>(key)?.to_string(),
            TypeHint::Float => store.get_typed::<f64>(key)?.to_string(),
            TypeHint::Bool => store.get_typed::<bool>(key)?.to_string(),
            TypeHint::Str => store.get_cloned::<String>(key)?,
            TypeHint::Any => render(&store.get(key)?),
        })
    }
}

impl FromStr for Lookup {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, hint) = match s.rsplit_once(':') {
            Some((key, hint)) => (key, hint.parse()?),
            None => (s, TypeHint::Any),
        };
        if key.is_empty() {
            return Err(StoreError::InvalidAssignment { input: s.to_string() });
        }
        Ok(Self {
            key: key.to_string(),
            hint,
        })
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Display a value of any of the seedable types; others show their type
pub fn render(value: &StoredValue) -> String {
    if let Some(i) = value.downcast_ref::<i64>() {
        i.to_string()
    } else if let Some(f) = value.downcast_ref::<f64>() {
        f.to_string()
    } else if let Some(b) = value.downcast_ref::<bool>() {
        b.to_string()
    } else if let Some(s) = value.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("<{}>", value.type_name())
    }
}
