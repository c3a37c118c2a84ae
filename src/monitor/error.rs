//! Error and warning types for the monitor layer.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::address::Address;
use crate::network::{EnumerateError, LookupError};

/// Error type for reconciliation passes.
///
/// Only a failed enumeration aborts a pass. Auxiliary lookup failures and
/// data anomalies are reported as [`Warning`]s instead.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The enumeration collaborator failed.
    #[error("Failed to enumerate interfaces: {0}")]
    Enumerate(#[from] EnumerateError),
}

/// Machine-readable warning code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WarningCode {
    /// The active-interface lookup failed.
    #[serde(rename = "EACTIVEERR")]
    ActiveLookup,
    /// The NIC-type lookup failed.
    #[serde(rename = "ENICTYPE")]
    NicTypeLookup,
    /// Two addresses of one interface produced the same key.
    #[serde(rename = "EDUPKEY")]
    DuplicateKey,
}

impl WarningCode {
    /// Returns the wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActiveLookup => "EACTIVEERR",
            Self::NicTypeLookup => "ENICTYPE",
            Self::DuplicateKey => "EDUPKEY",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable fault raised during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    /// Machine-readable code.
    pub code: WarningCode,
    /// Human-readable message.
    pub message: String,
    /// Rendered underlying cause, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// The interface concerned, for per-interface anomalies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_id: Option<String>,
    /// On a key collision, the record that was kept.
    #[serde(rename = "a", skip_serializing_if = "Option::is_none")]
    pub kept: Option<Arc<Address>>,
    /// On a key collision, the record that was dropped.
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub dropped: Option<Arc<Address>>,
}

impl Warning {
    /// The active-interface lookup failed with `cause`.
    #[must_use]
    pub fn active_lookup(cause: &LookupError) -> Self {
        Self {
            code: WarningCode::ActiveLookup,
            message: "Couldn't identify the active interface.".to_string(),
            cause: Some(cause.to_string()),
            interface_id: None,
            kept: None,
            dropped: None,
        }
    }

    /// The NIC-type lookup failed with `cause`.
    #[must_use]
    pub fn nic_type_lookup(cause: &LookupError) -> Self {
        Self {
            code: WarningCode::NicTypeLookup,
            message: "Wasn't able to lookup the interfaces.".to_string(),
            cause: Some(cause.to_string()),
            interface_id: None,
            kept: None,
            dropped: None,
        }
    }

    /// `dropped` collided with the earlier `kept` address of the same interface.
    #[must_use]
    pub fn duplicate_key(kept: &Arc<Address>, dropped: &Arc<Address>) -> Self {
        Self {
            code: WarningCode::DuplicateKey,
            message: format!(
                "Multiple network addresses with same key detected {}",
                kept.key
            ),
            cause: Some(format!(
                "{} dropped in favor of {}",
                dropped.address, kept.address
            )),
            interface_id: Some(kept.interface_id.clone()),
            kept: Some(Arc::clone(kept)),
            dropped: Some(Arc::clone(dropped)),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}
