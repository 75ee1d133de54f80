//! Core error types for Vigil.
//!
//! Defines the error shared by the foundation types plus the configuration
//! error used while loading `config.toml`.

use thiserror::Error;

/// Central error type for the shared Vigil types.
#[derive(Error, Debug)]
pub enum VigilError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The input could not be turned into an absolute http(s) URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Validation errors (invalid identifiers, unknown enum values)
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON encoding or decoding of a report failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
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

/// Result type alias using `VigilError`.
pub type Result<T> = std::result::Result<T, VigilError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VigilError::InvalidUrl("missing host".to_string());
        assert_eq!(err.to_string(), "invalid URL: missing host");

        let err = ConfigError::InvalidValue {
            field: "fetcher.max_redirects".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for fetcher.max_redirects: must be at least 1"
        );
    }

    #[test]
    fn test_error_from_config() {
        let vigil_err: VigilError = ConfigError::NoConfigDir.into();
        assert!(matches!(vigil_err, VigilError::Config(_)));
    }
}
