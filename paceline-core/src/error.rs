//! Error types for Paceline operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Not found: {what} with key {key}")]
    NotFound { what: &'static str, key: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Update failed: {reason}")]
    UpdateFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} out of range: must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Paceline errors.
#[derive(Debug, Clone, Error)]
pub enum PacelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Paceline operations.
pub type PacelineResult<T> = Result<T, PacelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            what: "tenant",
            key: "42".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Not found"));
        assert!(msg.contains("tenant"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_validation_error_display_out_of_range() {
        let err = ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 500,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("limit"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_paceline_error_from_variants() {
        let storage = PacelineError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, PacelineError::Storage(_)));

        let validation = PacelineError::from(ValidationError::RequiredFieldMissing {
            field: "offset".to_string(),
        });
        assert!(matches!(validation, PacelineError::Validation(_)));

        let config = PacelineError::from(ConfigError::MissingRequired {
            field: "db_host".to_string(),
        });
        assert!(matches!(config, PacelineError::Config(_)));
    }
}
