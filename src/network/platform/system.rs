//! Interface enumeration and default-route lookup backed by the `netdev` crate.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use crate::network::{
    ActiveInterfaceLookup, EnumerateError, Family, InterfaceEnumerator, LookupError, RawAddress,
    RawInterface,
};

use super::run_blocking;

/// MAC reported for interfaces without a hardware address.
const EMPTY_MAC: &str = "00:00:00:00:00:00";

/// Enumerates interfaces with `netdev::get_interfaces`.
///
/// Interfaces without any address are left out.
///
/// # Example
///
/// ```no_run
/// use netif_watch::network::{InterfaceEnumerator, platform::NetdevEnumerator};
///
/// let interfaces = NetdevEnumerator::new().enumerate().expect("enumeration failed");
/// for interface in interfaces {
///     println!("{}: {} address(es)", interface.id, interface.addresses.len());
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NetdevEnumerator;

impl NetdevEnumerator {
    /// Creates a new enumerator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InterfaceEnumerator for NetdevEnumerator {
    fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError> {
        let interfaces = ::netdev::get_interfaces()
            .into_iter()
            .map(|iface| {
                let mac = iface
                    .mac_addr
                    .map_or_else(|| EMPTY_MAC.to_string(), |mac| format_mac(mac.octets()));
                let internal = iface.is_loopback();

                let v4 = iface.ipv4.iter().map(|net| {
                    raw_address(IpAddr::V4(net.addr()), net.prefix_len(), &mac, None, internal)
                });
                let v6 = iface.ipv6.iter().map(|net| {
                    let addr = net.addr();
                    let scopeid = if is_link_local(addr) { iface.index } else { 0 };
                    raw_address(
                        IpAddr::V6(addr),
                        net.prefix_len(),
                        &mac,
                        Some(scopeid),
                        internal,
                    )
                });

                RawInterface::new(interface_id(&iface), v4.chain(v6).collect())
            });
        Ok(with_addresses(interfaces))
    }
}

/// Looks up the default-route interface with `netdev::get_default_interface`.
///
/// The query runs on the blocking pool and is bounded by `timeout`.
#[derive(Debug, Clone, Copy)]
pub struct NetdevActiveLookup {
    timeout: Duration,
}

impl NetdevActiveLookup {
    /// Creates a lookup that gives up after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ActiveInterfaceLookup for NetdevActiveLookup {
    async fn active_interface(&self) -> Result<Option<String>, LookupError> {
        // No default route is reported as an error string by netdev.
        run_blocking(self.timeout, || {
            Ok(::netdev::get_default_interface()
                .ok()
                .map(|iface| interface_id(&iface))
                .filter(|name| !name.is_empty()))
        })
        .await
    }
}

/// The id an interface is reported under.
pub(crate) fn interface_id(iface: &::netdev::Interface) -> String {
    #[cfg(windows)]
    if let Some(name) = iface.friendly_name.as_ref().filter(|name| !name.is_empty()) {
        return name.clone();
    }
    iface.name.clone()
}

fn with_addresses(interfaces: impl IntoIterator<Item = RawInterface>) -> Vec<RawInterface> {
    interfaces
        .into_iter()
        .filter(|iface| !iface.addresses.is_empty())
        .collect()
}

fn raw_address(
    addr: IpAddr,
    prefix_len: u8,
    mac: &str,
    scopeid: Option<u32>,
    internal: bool,
) -> RawAddress {
    let (family, netmask) = match addr {
        IpAddr::V4(_) => (Family::IPv4, IpAddr::V4(v4_netmask(prefix_len))),
        IpAddr::V6(_) => (Family::IPv6, IpAddr::V6(v6_netmask(prefix_len))),
    };

    RawAddress {
        address: addr.to_string(),
        netmask: netmask.to_string(),
        family,
        mac: mac.to_string(),
        scopeid,
        cidr: Some(format!("{addr}/{prefix_len}")),
        internal,
    }
}

/// Formats a MAC address as lowercase colon-separated hex.
pub(crate) fn format_mac(octets: [u8; 6]) -> String {
    octets
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

pub(crate) fn v4_netmask(prefix_len: u8) -> Ipv4Addr {
    let bits = match prefix_len {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    };
    Ipv4Addr::from(bits)
}

pub(crate) fn v6_netmask(prefix_len: u8) -> Ipv6Addr {
    let bits = match prefix_len {
        0 => 0,
        p if p >= 128 => u128::MAX,
        p => u128::MAX << (128 - u32::from(p)),
    };
    Ipv6Addr::from(bits)
}

const fn is_link_local(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}
