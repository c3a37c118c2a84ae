//! NIC-type classification from platform tools.
//!
//! - **Linux**: every interface listed in `/proc/net/wireless` is wireless.
//! - **macOS**: `networksetup -listallhardwareports` names the hardware port of each device.
//! - **Windows**: adapters whose type is 802.11 or whose description mentions
//!   Wi-Fi are wireless, every other non-loopback adapter is wired.
//! - **Other**: no classification; every interface falls back to `Other`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::network::{LookupError, NicType, NicTypeLookup, NicTypes};

#[cfg(any(target_os = "linux", target_os = "macos", windows))]
use super::run_blocking;

static WIRELESS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*([^\s:|]+):").expect("static regex"));
static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("static regex"));
static DEVICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Device: (.*)").expect("static regex"));
static PORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hardware Port: (.*)").expect("static regex"));
static PORT_KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(Ethernet)|(Wi-?Fi|AirPort)|(FireWire)|(Thunderbolt)|(Bluetooth))")
        .expect("static regex")
});
static WIRELESS_ADAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wi-?fi|wireless").expect("static regex"));

/// Looks up NIC types with the platform's native tooling.
#[derive(Debug, Clone, Copy)]
pub struct PlatformNicTypes {
    #[cfg_attr(
        not(any(target_os = "linux", target_os = "macos", windows)),
        allow(dead_code)
    )]
    timeout: Duration,
}

impl PlatformNicTypes {
    /// Creates a lookup that gives up after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl NicTypeLookup for PlatformNicTypes {
    #[cfg(target_os = "linux")]
    async fn nic_types(&self) -> Result<NicTypes, LookupError> {
        run_blocking(self.timeout, || {
            let content = std::fs::read_to_string("/proc/net/wireless")?;
            Ok(parse_proc_wireless(&content))
        })
        .await
    }

    #[cfg(target_os = "macos")]
    async fn nic_types(&self) -> Result<NicTypes, LookupError> {
        run_blocking(self.timeout, || {
            let output = std::process::Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()?;
            if !output.status.success() {
                return Err(LookupError::platform(format!(
                    "networksetup exited with {}",
                    output.status
                )));
            }
            Ok(parse_hardware_ports(&String::from_utf8_lossy(&output.stdout)))
        })
        .await
    }

    #[cfg(windows)]
    async fn nic_types(&self) -> Result<NicTypes, LookupError> {
        use ::netdev::interface::InterfaceType;

        run_blocking(self.timeout, || {
            Ok(::netdev::get_interfaces()
                .into_iter()
                .filter(|iface| !iface.is_loopback())
                .map(|iface| {
                    let wireless = iface.if_type == InterfaceType::Wireless80211;
                    let description = iface.description.as_deref().unwrap_or("");
                    let kind = classify_adapter(wireless, description);
                    (super::system::interface_id(&iface), kind)
                })
                .collect())
        })
        .await
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    async fn nic_types(&self) -> Result<NicTypes, LookupError> {
        Ok(NicTypes::new())
    }
}

/// Parses `/proc/net/wireless`; every listed interface is wireless.
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
///  face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
///  wlan1: 0000   21.  -66.  -256.       0      0      0      0      0        0
/// ```
#[must_use]
pub fn parse_proc_wireless(content: &str) -> NicTypes {
    WIRELESS_LINE
        .captures_iter(content)
        .map(|caps| (caps[1].to_string(), NicType::Wireless))
        .collect()
}

/// Parses the output of `networksetup -listallhardwareports`.
///
/// Blocks are separated by blank lines; each names a `Hardware Port` and its
/// `Device`. Ports of an unknown kind are left out of the map.
#[must_use]
pub fn parse_hardware_ports(output: &str) -> NicTypes {
    BLOCK_SEPARATOR
        .split(output)
        .filter_map(|block| {
            let device = DEVICE_LINE.captures(block)?[1].trim().to_string();
            let port = PORT_LINE.captures(block)?[1].trim().to_string();
            classify_port(&port).map(|kind| (device, kind))
        })
        .collect()
}

fn classify_port(port: &str) -> Option<NicType> {
    let caps = PORT_KIND.captures(port)?;
    [
        NicType::Wired,
        NicType::Wireless,
        NicType::Firewire,
        NicType::Thunderbolt,
        NicType::Bluetooth,
    ]
    .into_iter()
    .enumerate()
    .find_map(|(i, kind)| caps.get(i + 1).map(|_| kind))
}

/// Classifies a Windows adapter from its interface type and description.
///
/// `"Intel(R) Wi-Fi 6 AX201 160MHz"` is wireless, `"Realtek PCIe GbE Family Controller"` wired.
#[must_use]
pub fn classify_adapter(wireless_type: bool, description: &str) -> NicType {
    if wireless_type || WIRELESS_ADAPTER.is_match(description) {
        NicType::Wireless
    } else {
        NicType::Wired
    }
}
