//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid regex pattern for interface filtering.
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The invalid pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Invalid duration value (zero).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid framing name in the config file.
    #[error(transparent)]
    InvalidFraming(#[from] crate::encoding::ParseFramingError),
}

/// Well-known field names for `InvalidDuration` errors.
pub mod field {
    /// The maximum state age.
    pub const MAX_AGE: &str = "max_age";
    /// The lookup timeout.
    pub const LOOKUP_TIMEOUT: &str = "lookup_timeout";
}

impl ConfigError {
    /// Creates an `InvalidDuration` error for a zero value.
    #[must_use]
    pub fn zero_duration(field: &'static str) -> Self {
        Self::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        }
    }
}
