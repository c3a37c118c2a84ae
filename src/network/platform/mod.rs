//! Platform implementations of the enumeration and lookup collaborators.
//!
//! # Platform Support
//!
//! - **Enumeration / active interface**: `netdev` on every supported OS.
//! - **NIC types**: `/proc/net/wireless` on Linux, `networksetup` on macOS,
//!   adapter type and description on Windows, empty elsewhere.
//!
//! On Windows interfaces are identified by their connection name
//! (`"Wi-Fi"`, `"Ethernet"`), elsewhere by the kernel name.

mod nic_types;
mod system;

pub use nic_types::{
    PlatformNicTypes, classify_adapter, parse_hardware_ports, parse_proc_wireless,
};
pub use system::{NetdevActiveLookup, NetdevEnumerator};

use std::time::Duration;

use super::LookupError;

/// Re-export of the default enumerator under a platform-neutral name.
pub type PlatformEnumerator = NetdevEnumerator;

/// Runs a blocking platform query on the blocking pool, bounded by `timeout`.
///
/// The closure keeps running on its thread if the deadline elapses; only
/// the caller stops waiting.
pub(crate) async fn run_blocking<T, F>(timeout: Duration, query: F) -> Result<T, LookupError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LookupError> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(query)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(LookupError::platform(format!("lookup task failed: {join}"))),
        Err(_) => Err(LookupError::TimedOut { after: timeout }),
    }
}
