//! Raw interface and address descriptors as reported by the OS.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address family of a bound address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    /// An IPv4 address.
    IPv4,
    /// An IPv6 address.
    IPv6,
}

impl Family {
    /// Returns the canonical textual form (`"IPv4"` or `"IPv6"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IPv4 => "IPv4",
            Self::IPv6 => "IPv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown family name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid address family '{0}': expected ipv4 or ipv6")]
pub struct ParseFamilyError(pub String);

impl FromStr for Family {
    type Err = ParseFamilyError;

    /// Accepts `ipv4`/`v4`/`4` and `ipv6`/`v6`/`6`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipv4" | "v4" | "4" => Ok(Self::IPv4),
            "ipv6" | "v6" | "6" => Ok(Self::IPv6),
            _ => Err(ParseFamilyError(s.to_string())),
        }
    }
}

/// Hardware class of a network interface.
///
/// Serialized with the capitalized names used on the wire (`"Wired"`, `"Other"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NicType {
    /// Wired Ethernet.
    Wired,
    /// Wi-Fi / `AirPort`.
    Wireless,
    /// `FireWire` (IEEE 1394).
    Firewire,
    /// Thunderbolt bridge.
    Thunderbolt,
    /// Bluetooth PAN.
    Bluetooth,
    /// Unknown or not reported by the lookup.
    #[default]
    Other,
}

impl fmt::Display for NicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wired => "Wired",
            Self::Wireless => "Wireless",
            Self::Firewire => "Firewire",
            Self::Thunderbolt => "Thunderbolt",
            Self::Bluetooth => "Bluetooth",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Mapping from interface identifier to NIC type, as produced by a [`super::NicTypeLookup`].
pub type NicTypes = HashMap<String, NicType>;

/// One address record exactly as the enumeration collaborator reports it.
///
/// Field names follow the wire format (`scopeid`, `cidr`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawAddress {
    /// Textual address (e.g. `"192.168.1.10"`, `"fe80::1"`).
    pub address: String,
    /// Textual netmask.
    pub netmask: String,
    /// Address family.
    pub family: Family,
    /// MAC address of the owning interface, lowercase colon hex.
    pub mac: String,
    /// IPv6 scope id; absent for IPv4.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopeid: Option<u32>,
    /// `address/prefix` notation; absent when the netmask is not contiguous.
    pub cidr: Option<String>,
    /// Whether the address is loopback / only reachable from this host.
    pub internal: bool,
}

impl RawAddress {
    /// Creates a raw address with the given textual form and family.
    ///
    /// Remaining fields start empty and can be filled with the `with_*` builders.
    #[must_use]
    pub fn new(address: impl Into<String>, family: Family) -> Self {
        Self {
            address: address.into(),
            netmask: String::new(),
            family,
            mac: String::new(),
            scopeid: None,
            cidr: None,
            internal: false,
        }
    }

    /// Sets the MAC address.
    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    /// Sets the netmask.
    #[must_use]
    pub fn with_netmask(mut self, netmask: impl Into<String>) -> Self {
        self.netmask = netmask.into();
        self
    }

    /// Sets the IPv6 scope id.
    #[must_use]
    pub const fn with_scopeid(mut self, scopeid: u32) -> Self {
        self.scopeid = Some(scopeid);
        self
    }

    /// Sets the CIDR notation.
    #[must_use]
    pub fn with_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr = Some(cidr.into());
        self
    }

    /// Marks the address as internal (loopback).
    #[must_use]
    pub const fn internal(mut self) -> Self {
        self.internal = true;
        self
    }
}

/// One interface and its addresses in OS-reported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterface {
    /// OS identifier of the interface (e.g. `"eth0"`, `"Wi-Fi"`).
    pub id: String,
    /// Addresses bound to the interface.
    pub addresses: Vec<RawAddress>,
}

impl RawInterface {
    /// Creates a raw interface record.
    #[must_use]
    pub fn new(id: impl Into<String>, addresses: Vec<RawAddress>) -> Self {
        Self {
            id: id.into(),
            addresses,
        }
    }
}
