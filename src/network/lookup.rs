//! Asynchronous auxiliary lookups: active interface and NIC types.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::NicTypes;

/// Error type for auxiliary lookups.
///
/// A failed lookup never aborts reconciliation; the engine reports it
/// as a warning and keeps using the last successful value.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Reading a system file or running a helper command failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The lookup did not finish within its own deadline.
    #[error("Lookup timed out after {}ms", after.as_millis())]
    TimedOut {
        /// The deadline that elapsed.
        after: Duration,
    },

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

impl LookupError {
    /// Creates a `Platform` error from any displayable message.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

/// Finds the interface currently carrying the default route.
///
/// Implementations must apply their own timeout.
pub trait ActiveInterfaceLookup: Send + Sync {
    /// Returns the active interface id, or `None` when there is no default route.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the platform query fails.
    fn active_interface(
        &self,
    ) -> impl Future<Output = Result<Option<String>, LookupError>> + Send;
}

/// Classifies interfaces by hardware type.
///
/// Implementations must apply their own timeout. Interfaces missing from
/// the returned map are treated as [`super::NicType::Other`].
pub trait NicTypeLookup: Send + Sync {
    /// Returns the NIC type of every interface the platform can classify.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the platform query fails.
    fn nic_types(&self) -> impl Future<Output = Result<NicTypes, LookupError>> + Send;
}

impl<T: ActiveInterfaceLookup> ActiveInterfaceLookup for Arc<T> {
    fn active_interface(
        &self,
    ) -> impl Future<Output = Result<Option<String>, LookupError>> + Send {
        (**self).active_interface()
    }
}

impl<T: NicTypeLookup> NicTypeLookup for Arc<T> {
    fn nic_types(&self) -> impl Future<Output = Result<NicTypes, LookupError>> + Send {
        (**self).nic_types()
    }
}
