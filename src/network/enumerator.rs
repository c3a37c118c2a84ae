//! Interface enumeration trait and error types.

use super::RawInterface;
use thiserror::Error;

/// Error type for interface enumeration.
///
/// Enumeration is expected to succeed in the steady state; any error
/// aborts the reconciliation pass that requested it.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// Permission denied to access network information.
    #[error("Permission denied: {context}")]
    PermissionDenied {
        /// Additional context about what permission was denied.
        context: String,
    },

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

/// Trait for enumerating the host's interfaces and their addresses.
///
/// # Design
///
/// - The core never inspects the OS directly; it only calls this trait
/// - Enables dependency injection for testing with scripted implementations
/// - Platform implementations live in [`super::platform`]
///
/// # Example
///
/// ```ignore
/// use netif_watch::network::{EnumerateError, InterfaceEnumerator, RawInterface};
///
/// struct Fixed(Vec<RawInterface>);
///
/// impl InterfaceEnumerator for Fixed {
///     fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait InterfaceEnumerator: Send + Sync {
    /// Returns every interface with its addresses.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerateError`] when the platform call fails.
    ///
    /// # Implementation Notes
    ///
    /// - Interface order is the OS-reported order and determines event order
    /// - Address order within an interface should be stable across calls
    /// - This is a synchronous, fast operation
    fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError>;
}

impl<T: InterfaceEnumerator + ?Sized> InterfaceEnumerator for std::sync::Arc<T> {
    fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError> {
        (**self).enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Family, RawAddress};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted enumerator returning predefined results in order.
    struct MockEnumerator {
        results: Mutex<VecDeque<Result<Vec<RawInterface>, EnumerateError>>>,
    }

    impl MockEnumerator {
        fn new(results: Vec<Result<Vec<RawInterface>, EnumerateError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
            }
        }
    }

    impl InterfaceEnumerator for MockEnumerator {
        fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError> {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }
    }

    #[test]
    fn mock_returns_scripted_results_in_order() {
        let lo = RawInterface::new("lo", vec![RawAddress::new("127.0.0.1", Family::IPv4)]);
        let eth = RawInterface::new("eth0", vec![]);
        let enumerator = MockEnumerator::new(vec![Ok(vec![lo.clone()]), Ok(vec![eth.clone()])]);

        assert_eq!(enumerator.enumerate().unwrap(), vec![lo]);
        assert_eq!(enumerator.enumerate().unwrap(), vec![eth]);
        assert!(enumerator.enumerate().unwrap().is_empty());
    }

    #[test]
    fn arc_delegates_to_inner() {
        let enumerator = Arc::new(MockEnumerator::new(vec![Err(EnumerateError::Platform {
            message: "boom".to_string(),
        })]));

        let err = enumerator.enumerate().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn permission_denied_displays_context() {
        let error = EnumerateError::PermissionDenied {
            context: "elevated privileges required".to_string(),
        };
        assert!(error.to_string().contains("elevated privileges required"));
    }
}
