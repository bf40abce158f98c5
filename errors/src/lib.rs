//! # Configuration Resolver Errors
//!
//! Error taxonomy shared by the resolver, its stores and test tooling.
//!
//! - `ConversionError` is the only error that leaves `get`/`set`
//! - `StoreError` is produced by store adapters and absorbed by the engine
//! - `ConfigureError` is returned while a resolver is being built

use thiserror::Error;

/// A raw value could not be converted to (or from) an option's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot convert {raw_value:?} for option {option_name} to {target_type}: {reason}")]
pub struct ConversionError {
    pub option_name: String,
    pub raw_value: String,
    pub target_type: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        option_name: impl Into<String>,
        raw_value: impl Into<String>,
        target_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            option_name: option_name.into(),
            raw_value: raw_value.into(),
            target_type: target_type.into(),
            reason: reason.into(),
        }
    }
}

/// Store adapter failures.
///
/// The resolution engine never surfaces these to its callers; they are
/// reported through the diagnostic callback and the next store is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store {store} unavailable: {reason}")]
    Unavailable { store: String, reason: String },

    #[error("IO error in store {store}: {reason}")]
    Io { store: String, reason: String },

    #[error("Store {store} holds an unreadable value: {reason}")]
    Parse { store: String, reason: String },
}

impl StoreError {
    pub fn unavailable(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Name of the store that failed.
    pub fn store(&self) -> &str {
        match self {
            Self::Unavailable { store, .. } | Self::Io { store, .. } | Self::Parse { store, .. } => {
                store
            }
        }
    }
}

/// Misuse of the resolver builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigureError {
    #[error("Option declared twice: {name}")]
    DuplicateOption { name: String },

    #[error("Option name must not be empty")]
    EmptyOptionName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display_names_all_fields() {
        let err = ConversionError::new("db.port", "not-a-number", "integer", "invalid digit");
        let msg = err.to_string();
        assert!(msg.contains("db.port"));
        assert!(msg.contains("\"not-a-number\""));
        assert!(msg.contains("integer"));
        assert!(msg.contains("invalid digit"));
    }

    #[test]
    fn test_store_error_reports_store_name() {
        let err = StoreError::unavailable("vault", "connection refused");
        assert_eq!(err.store(), "vault");
        assert_eq!(err.to_string(), "Store vault unavailable: connection refused");

        let err = StoreError::Parse {
            store: "env".to_string(),
            reason: "not unicode".to_string(),
        };
        assert_eq!(err.store(), "env");
    }

    #[test]
    fn test_configure_error_display() {
        let err = ConfigureError::DuplicateOption {
            name: "log.level".to_string(),
        };
        assert_eq!(err.to_string(), "Option declared twice: log.level");
        assert_eq!(
            ConfigureError::EmptyOptionName.to_string(),
            "Option name must not be empty"
        );
    }
}
