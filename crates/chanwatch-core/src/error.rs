//! Core error types for the Chanwatch audit.
//!
//! Each crate owns its own error enum; this module holds the errors raised
//! while building domain values and loading configuration.

use thiserror::Error;

/// Error type for domain value construction.
#[derive(Error, Debug)]
pub enum ChanwatchError {
    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found at an explicitly requested path
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `ChanwatchError`.
pub type Result<T> = std::result::Result<T, ChanwatchError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChanwatchError::Validation("empty channel group".to_string());
        assert_eq!(err.to_string(), "validation error: empty channel group");

        let err = ConfigError::invalid("scan.page_size", "must be between 1 and 250");
        assert_eq!(
            err.to_string(),
            "invalid config value for scan.page_size: must be between 1 and 250"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
