//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::encoding::Framing;
use crate::network::Family;

/// netif-watch: network interface and address watcher
///
/// Watches the host's network interfaces and prints every added, updated
/// or removed interface and address as framed JSON.
#[derive(Debug, Parser)]
#[command(name = "netif-watch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (defaults to `watch`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Maximum state age in milliseconds; also the polling period while watching
    #[arg(long = "max-age", value_name = "MS", global = true)]
    pub max_age: Option<u64>,

    /// Output framing
    #[arg(long, value_enum, global = true)]
    pub framing: Option<FramingArg>,

    /// Timeout in milliseconds for the active-interface and NIC-type lookups
    #[arg(long = "lookup-timeout", value_name = "MS", global = true)]
    pub lookup_timeout: Option<u64>,

    /// Regex pattern for interfaces to include (can be specified multiple times)
    #[arg(long = "include", value_name = "PATTERN", global = true)]
    pub include: Vec<String>,

    /// Regex pattern for interfaces to exclude (can be specified multiple times)
    #[arg(long = "exclude", value_name = "PATTERN", global = true)]
    pub exclude: Vec<String>,

    /// Do not print warnings to stderr
    #[arg(long = "no-warnings", global = true)]
    pub no_warnings: bool,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for netif-watch
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "netif-watch.toml")]
        output: PathBuf,
    },

    /// Print every change until interrupted (default)
    Watch,

    /// Print the current state as add events and exit
    State,

    /// Print the id of the interface carrying the default route
    Active,

    /// Print whether an address is bound to this host
    IsLocal {
        /// Address family (ipv4 or ipv6)
        family: Family,
        /// Address to test
        address: String,
    },

    /// Print the internal address to use in place of a local one
    PreferInternal {
        /// Address family (ipv4 or ipv6)
        family: Family,
        /// Address to map
        address: String,
    },
}

/// Framing argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// One JSON document per line
    #[value(name = "line")]
    Line,
    /// JSON documents prefixed with their length
    #[value(name = "length-prefixed")]
    LengthPrefixed,
    /// JSON documents back to back
    #[value(name = "concatenated")]
    Concatenated,
    /// RFC 7464 record separator sequences
    #[value(name = "record-separator")]
    RecordSeparator,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Line => Self::Line,
            FramingArg::LengthPrefixed => Self::LengthPrefixed,
            FramingArg::Concatenated => Self::Concatenated,
            FramingArg::RecordSeparator => Self::RecordSeparator,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns the subcommand to run, defaulting to [`Command::Watch`].
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }
}
