//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Engine configuration
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Interface filter configuration
    #[serde(default)]
    pub filter: FilterSection,

    /// Output configuration
    #[serde(default)]
    pub output: OutputSection,
}

/// Engine configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Maximum state age in milliseconds
    pub max_age: Option<u64>,

    /// Lookup timeout in milliseconds
    pub lookup_timeout: Option<u64>,
}

/// Interface filter configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Regex patterns for interfaces to include
    #[serde(default)]
    pub include: Vec<String>,

    /// Regex patterns for interfaces to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Output configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Framing name: "line", "length-prefixed", "concatenated" or "record-separator"
    pub framing: Option<String>,

    /// Print warnings to stderr
    pub warnings: Option<bool>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# netif-watch configuration file

[monitor]
# Maximum age of observed state in milliseconds (default: 250).
# Reads older than this trigger a fresh poll; while watching, the
# interfaces are polled once per max_age.
max_age = 250

# Timeout in milliseconds for the active-interface and NIC-type lookups (default: 5000)
# lookup_timeout = 5000

[filter]
# Regex patterns for interfaces to include (empty = all)
# Note: CLI patterns REPLACE these entirely (not merged)
# include = ["^eth", "^en", "^wl"]

# Regex patterns for interfaces to exclude
# Note: CLI patterns REPLACE these entirely (not merged)
# exclude = ["^docker", "^veth", "^br-"]

[output]
# Framing of printed records (default: "line")
# Accepted values: "line", "length-prefixed", "concatenated", "record-separator"
framing = "line"

# Print warnings (failed lookups, duplicate address keys) to stderr (default: true)
# warnings = true
"#
    .to_string()
}
