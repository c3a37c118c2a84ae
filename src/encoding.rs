//! Framing conventions for writing records to byte streams.
//!
//! Every convention wraps the compact JSON text of one record:
//!
//! | Framing | Output |
//! |---------|--------|
//! | [`Framing::LengthPrefixed`] | `<length><json>` |
//! | [`Framing::Concatenated`] | `<json>` |
//! | [`Framing::RecordSeparator`] | `\x1e<json>\n` |
//! | [`Framing::Line`] | `<json>\n` |
//!
//! The length prefix is the decimal count of UTF-16 code units in the JSON
//! text, which equals its byte length for ASCII payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ASCII record separator.
const RS: char = '\u{1e}';

/// How records are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Decimal UTF-16 length immediately followed by the JSON text.
    LengthPrefixed,
    /// JSON texts back to back.
    Concatenated,
    /// RFC 7464 JSON text sequences.
    RecordSeparator,
    /// One JSON text per line.
    #[default]
    Line,
}

impl Framing {
    /// All framings, in documentation order.
    pub const ALL: [Self; 4] = [
        Self::LengthPrefixed,
        Self::Concatenated,
        Self::RecordSeparator,
        Self::Line,
    ];

    /// Returns the configuration name of this framing.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LengthPrefixed => "length-prefixed",
            Self::Concatenated => "concatenated",
            Self::RecordSeparator => "record-separator",
            Self::Line => "line",
        }
    }

    /// Wraps already serialized JSON text.
    #[must_use]
    pub fn frame(self, json: &str) -> String {
        match self {
            Self::LengthPrefixed => format!("{}{json}", json.encode_utf16().count()),
            Self::Concatenated => json.to_string(),
            Self::RecordSeparator => format!("{RS}{json}\n"),
            Self::Line => format!("{json}\n"),
        }
    }

    /// Serializes `value` to compact JSON and frames it.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `value` cannot be represented as JSON.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(value).map(|json| self.frame(&json))
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a framing name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown framing '{0}' (expected one of: length-prefixed, concatenated, record-separator, line)")]
pub struct ParseFramingError(pub String);

impl FromStr for Framing {
    type Err = ParseFramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|framing| framing.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseFramingError(s.to_string()))
    }
}

/// A record preceded by a `time` field in milliseconds since the Unix epoch.
#[derive(Debug, Serialize)]
pub struct Timestamped<'a, T: Serialize> {
    /// Milliseconds since the Unix epoch.
    pub time: u64,
    /// The record whose fields follow `time`.
    #[serde(flatten)]
    pub record: &'a T,
}

impl<'a, T: Serialize> Timestamped<'a, T> {
    /// Stamps `record` with `time`.
    pub const fn new(time: u64, record: &'a T) -> Self {
        Self { time, record }
    }
}
