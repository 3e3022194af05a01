//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Every store failure is a programming or configuration defect.
/// None of these are meant to be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    // ─────────────────────────────────────────────────────────────
    // Store contract errors (STORE-001 to STORE-004)
    // ─────────────────────────────────────────────────────────────

    #[error("STORE-001: key '{key}' missing from {store}")]
    MissingKey { key: String, store: &'static str },

    #[error("STORE-002: key '{key}' resolves to type [{actual}], not [{expected}] as expected")]
    TypeMismatch {
        key: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("STORE-003: attempt to alter immutable configuration key '{key}'")]
    ImmutableConfig { key: String },

    #[error("STORE-004: no task scope is active on this task")]
    NoActiveScope,

    // ─────────────────────────────────────────────────────────────
    // CLI input errors (STORE-010 to STORE-011)
    // ─────────────────────────────────────────────────────────────

    #[error("STORE-010: invalid assignment '{input}' (expected KEY=VALUE)")]
    InvalidAssignment { input: String },

    #[error("STORE-011: unknown type '{name}'")]
    UnknownType { name: String },
}

impl StoreError {
    pub fn missing(key: impl Into<String>, store: &'static str) -> Self {
        Self::MissingKey {
            key: key.into(),
            store,
        }
    }
}

impl FixSuggestion for StoreError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            StoreError::MissingKey { .. } => {
                Some("Give the key a default during startup, or check has() before reading")
            }
            StoreError::TypeMismatch { .. } => {
                Some("Read the key with the type it was stored as")
            }
            StoreError::ImmutableConfig { .. } => {
                Some("Set configuration before freezing the store")
            }
            StoreError::NoActiveScope => {
                Some("Wrap the unit of work in TaskScope::run(...)")
            }
            StoreError::InvalidAssignment { .. } => Some("Use the form key=value, e.g. db.port=5432"),
            StoreError::UnknownType { .. } => Some("Use one of: int, float, bool, str, any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_key_and_types() {
        let err = StoreError::TypeMismatch {
            key: "db.port".into(),
            actual: "alloc::string::String",
            expected: "i64",
        };
        let msg = err.to_string();
        assert!(msg.starts_with("STORE-002"));
        assert!(msg.contains("db.port"));
        assert!(msg.contains("alloc::string::String"));
        assert!(msg.contains("i64"));
    }

    #[test]
    fn missing_names_the_store() {
        let err = StoreError::missing("x", "ConfigStore");
        assert_eq!(err.to_string(), "STORE-001: key 'x' missing from ConfigStore");
    }

    #[test]
    fn every_variant_has_a_suggestion() {
        let errors = [
            StoreError::missing("k", "SharedStore"),
            StoreError::ImmutableConfig { key: "k".into() },
            StoreError::NoActiveScope,
            StoreError::InvalidAssignment { input: "k".into() },
            StoreError::UnknownType { name: "u8".into() },
        ];
        for err in errors {
            assert!(err.fix_suggestion().is_some(), "{err}");
        }
    }
}
