//! Canonical address and interface records.
//!
//! Turns raw OS descriptors into entities with a stable identity `key`
//! and a content `hash` used for change detection.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Serialize, Serializer};

use crate::network::{Family, NicType, NicTypes, RawAddress};

/// Content digest of a record.
///
/// Equal content always yields an equal digest within a process.
/// Serialized as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(u64);

impl Digest {
    fn of<T: Hash + ?Sized>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One address bound to one interface, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Textual address.
    pub address: String,
    /// Textual netmask.
    pub netmask: String,
    /// Address family.
    pub family: Family,
    /// MAC address of the owning interface.
    pub mac: String,
    /// IPv6 scope id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopeid: Option<u32>,
    /// `address/prefix` notation.
    pub cidr: Option<String>,
    /// Loopback / self-reachable.
    pub internal: bool,
    /// Owning interface id.
    pub interface_id: String,
    /// Identity of the address slot across polls.
    pub key: String,
    /// Digest of the raw record.
    pub hash: Digest,
}

impl Address {
    /// Normalizes one raw address owned by `interface_id`.
    #[must_use]
    pub fn normalize(interface_id: &str, raw: RawAddress) -> Self {
        let key = address_key(interface_id, &raw.mac, raw.family, raw.scopeid);
        let hash = Digest::of(&raw);
        let RawAddress {
            address,
            netmask,
            family,
            mac,
            scopeid,
            cidr,
            internal,
        } = raw;

        Self {
            address,
            netmask,
            family,
            mac,
            scopeid,
            cidr,
            internal,
            interface_id: interface_id.to_string(),
            key,
            hash,
        }
    }
}

/// Builds the identity key `[interfaceId, mac, family, scopeid-or-0]` as compact JSON.
///
/// ```
/// use netif_watch::monitor::address_key;
/// use netif_watch::network::Family;
///
/// assert_eq!(address_key("lo", "do", Family::IPv4, None), r#"["lo","do","IPv4",0]"#);
/// ```
#[must_use]
pub fn address_key(interface_id: &str, mac: &str, family: Family, scopeid: Option<u32>) -> String {
    serde_json::json!([interface_id, mac, family.as_str(), scopeid.unwrap_or(0)]).to_string()
}

/// Semantic state of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    /// OS identifier.
    pub id: String,
    /// Carries the default route.
    pub active: bool,
    /// Hardware class.
    pub nic_type: NicType,
    /// Digest of `(id, active, nic_type)`.
    pub hash: Digest,
}

impl InterfaceInfo {
    /// Creates interface info and computes its digest.
    #[must_use]
    pub fn new(id: impl Into<String>, active: bool, nic_type: NicType) -> Self {
        let id = id.into();
        let hash = Digest::of(&(id.as_str(), active, nic_type));
        Self {
            id,
            active,
            nic_type,
            hash,
        }
    }

    /// Derives the info of `id` from the auxiliary lookup results.
    ///
    /// Unknown or missing NIC types fall back to [`NicType::Other`].
    #[must_use]
    pub fn derive(id: &str, active_id: Option<&str>, nic_types: Option<&NicTypes>) -> Self {
        let nic_type = nic_types
            .and_then(|types| types.get(id))
            .copied()
            .unwrap_or_default();
        Self::new(id, active_id == Some(id), nic_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(family: Family, mac: &str) -> RawAddress {
        RawAddress::new("10.0.0.1", family).with_mac(mac)
    }

    mod key {
        use super::*;

        #[test]
        fn encodes_identity_tuple() {
            assert_eq!(
                address_key("lo", "do", Family::IPv4, None),
                r#"["lo","do","IPv4",0]"#
            );
            assert_eq!(
                address_key("eth0", "aa:bb", Family::IPv6, Some(3)),
                r#"["eth0","aa:bb","IPv6",3]"#
            );
        }

        #[test]
        fn missing_scopeid_equals_zero() {
            assert_eq!(
                address_key("eth0", "m", Family::IPv6, None),
                address_key("eth0", "m", Family::IPv6, Some(0))
            );
        }

        #[test]
        fn ignores_address_value() {
            let a = Address::normalize("eth0", raw(Family::IPv4, "m"));
            let mut other = raw(Family::IPv4, "m");
            other.address = "10.0.0.2".to_string();
            let b = Address::normalize("eth0", other);

            assert_eq!(a.key, b.key);
            assert_ne!(a.hash, b.hash);
        }

        #[test]
        fn escapes_quotes_in_ids() {
            let key = address_key(r#"we"ird"#, "m", Family::IPv4, None);
            assert_eq!(key, r#"["we\"ird","m","IPv4",0]"#);
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn copies_fields_and_sets_owner() {
            let address = Address::normalize(
                "lo",
                RawAddress::new("127.0.0.1", Family::IPv4)
                    .with_mac("00:00:00:00:00:00")
                    .with_netmask("255.0.0.0")
                    .with_cidr("127.0.0.1/8")
                    .internal(),
            );

            assert_eq!(address.address, "127.0.0.1");
            assert_eq!(address.netmask, "255.0.0.0");
            assert_eq!(address.interface_id, "lo");
            assert!(address.internal);
            assert_eq!(address.key, r#"["lo","00:00:00:00:00:00","IPv4",0]"#);
        }

        #[test]
        fn equal_content_has_equal_hash() {
            let a = Address::normalize("eth0", raw(Family::IPv4, "m"));
            let b = Address::normalize("eth0", raw(Family::IPv4, "m"));
            assert_eq!(a.hash, b.hash);
        }

        #[test]
        fn serializes_wire_field_names() {
            let json = serde_json::to_value(Address::normalize("lo", raw(Family::IPv4, "do"))).unwrap();

            assert_eq!(json["interfaceId"], "lo");
            assert_eq!(json["family"], "IPv4");
            assert!(json["hash"].as_str().unwrap().len() == 16);
            assert!(json.get("scopeid").is_none());
        }
    }

    mod interface_info {
        use super::*;

        #[test]
        fn derive_defaults_to_inactive_other() {
            let info = InterfaceInfo::derive("lo", None, None);

            assert_eq!(info.id, "lo");
            assert!(!info.active);
            assert_eq!(info.nic_type, NicType::Other);
        }

        #[test]
        fn derive_uses_lookups() {
            let types: NicTypes = [("wlan0".to_string(), NicType::Wireless)].into();
            let info = InterfaceInfo::derive("wlan0", Some("wlan0"), Some(&types));

            assert!(info.active);
            assert_eq!(info.nic_type, NicType::Wireless);
        }

        #[test]
        fn hash_tracks_semantic_fields() {
            let base = InterfaceInfo::new("eth0", false, NicType::Wired);

            assert_eq!(base.hash, InterfaceInfo::new("eth0", false, NicType::Wired).hash);
            assert_ne!(base.hash, InterfaceInfo::new("eth0", true, NicType::Wired).hash);
            assert_ne!(base.hash, InterfaceInfo::new("eth0", false, NicType::Other).hash);
            assert_ne!(base.hash, InterfaceInfo::new("eth1", false, NicType::Wired).hash);
        }

        #[test]
        fn serializes_nic_type_camel_case() {
            let json = serde_json::to_value(InterfaceInfo::new("lo", false, NicType::Other)).unwrap();

            assert_eq!(json["nicType"], "Other");
            assert_eq!(json["active"], false);
        }
    }
}
