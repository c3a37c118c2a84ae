//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::encoding::Framing;
use crate::monitor::WatchOptions;
use crate::network::filter::{FilterChain, NameRegexFilter};

use super::cli::{Cli, Command};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Subcommand to run
    pub command: Command,

    /// Maximum state age
    pub max_age: Duration,

    /// Timeout applied by the platform lookups
    pub lookup_timeout: Duration,

    /// Output framing
    pub framing: Framing,

    /// Interface name filter
    pub filter: FilterChain,

    /// Whether warnings are printed
    pub warnings: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ max_age: {}ms, lookup_timeout: {}ms, framing: {}, warnings: {}, filters: {} }}",
            self.max_age.as_millis(),
            self.lookup_timeout.as_millis(),
            self.framing,
            self.warnings,
            self.filter.len(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Regex patterns are invalid
    /// - Duration values are zero
    /// - The TOML framing name is unknown
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let max_age = resolve_millis(
            cli.max_age,
            toml.and_then(|t| t.monitor.max_age),
            defaults::MAX_AGE_MS,
            field::MAX_AGE,
        )?;

        let lookup_timeout = resolve_millis(
            cli.lookup_timeout,
            toml.and_then(|t| t.monitor.lookup_timeout),
            defaults::LOOKUP_TIMEOUT_MS,
            field::LOOKUP_TIMEOUT,
        )?;

        let framing = Self::resolve_framing(cli, toml)?;
        let filter = Self::build_filter(cli, toml)?;

        // --no-warnings wins, then TOML, then default
        let warnings = !cli.no_warnings
            && toml
                .and_then(|t| t.output.warnings)
                .unwrap_or(defaults::WARNINGS);

        Ok(Self {
            command: cli.command(),
            max_age,
            lookup_timeout,
            framing,
            filter,
            warnings,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Returns the engine options.
    #[must_use]
    pub const fn watch_options(&self) -> WatchOptions {
        WatchOptions::new(self.max_age)
    }

    fn resolve_framing(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Framing, ConfigError> {
        // Priority: CLI explicit > TOML > default
        if let Some(framing) = cli.framing {
            return Ok(framing.into());
        }

        match toml.and_then(|t| t.output.framing.as_deref()) {
            Some(name) => Ok(name.parse::<Framing>()?),
            None => Ok(Framing::default()),
        }
    }

    fn build_filter(cli: &Cli, toml: Option<&TomlConfig>) -> Result<FilterChain, ConfigError> {
        // CLI patterns replace TOML patterns, per list
        let include = if cli.include.is_empty() {
            toml.map_or(&[][..], |t| t.filter.include.as_slice())
        } else {
            cli.include.as_slice()
        };
        let exclude = if cli.exclude.is_empty() {
            toml.map_or(&[][..], |t| t.filter.exclude.as_slice())
        } else {
            cli.exclude.as_slice()
        };

        let mut filter = FilterChain::new();
        for pattern in include {
            filter = filter.include(compile(pattern)?);
        }
        for pattern in exclude {
            filter = filter.exclude(compile(pattern)?);
        }

        Ok(filter)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn resolve_millis(
    cli: Option<u64>,
    toml: Option<u64>,
    default: u64,
    field: &'static str,
) -> Result<Duration, ConfigError> {
    let millis = cli.or(toml).unwrap_or(default);
    if millis == 0 {
        return Err(ConfigError::zero_duration(field));
    }
    Ok(Duration::from_millis(millis))
}

fn compile(pattern: &str) -> Result<NameRegexFilter, ConfigError> {
    NameRegexFilter::new(pattern).map_err(|e| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        source: e,
    })
}
