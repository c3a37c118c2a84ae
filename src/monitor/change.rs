//! Change events emitted by reconciliation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::address::{Address, InterfaceInfo};

/// The kind of a [`Change`], matching its wire `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An interface appeared.
    AddInterface,
    /// An interface's info changed.
    UpdateInterface,
    /// An interface vanished.
    DeleteInterface,
    /// An address slot appeared.
    AddAddress,
    /// An address slot's content changed.
    UpdateAddress,
    /// An address slot vanished.
    DeleteAddress,
}

impl ChangeKind {
    /// Returns the wire tag (`"add-interface"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddInterface => "add-interface",
            Self::UpdateInterface => "update-interface",
            Self::DeleteInterface => "delete-interface",
            Self::AddAddress => "add-address",
            Self::UpdateAddress => "update-address",
            Self::DeleteAddress => "delete-address",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected difference between the store and the OS.
///
/// Records are shared via [`Arc`] with the store and never mutated after
/// construction, so cloning a change is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Change {
    /// A new interface.
    AddInterface {
        /// The interface info.
        info: Arc<InterfaceInfo>,
    },
    /// An interface whose info hash changed.
    UpdateInterface {
        /// The new info.
        info: Arc<InterfaceInfo>,
        /// The previously stored info.
        #[serde(rename = "oldInfo")]
        old_info: Arc<InterfaceInfo>,
    },
    /// A vanished interface. Its addresses are deleted first.
    DeleteInterface {
        /// The last known info.
        info: Arc<InterfaceInfo>,
    },
    /// A new address slot.
    AddAddress {
        /// The address.
        address: Arc<Address>,
    },
    /// An address slot whose content changed. Both records share the same key.
    UpdateAddress {
        /// The new address.
        address: Arc<Address>,
        /// The previously stored address.
        #[serde(rename = "oldAddress")]
        old_address: Arc<Address>,
    },
    /// A vanished address slot.
    DeleteAddress {
        /// The last known address.
        address: Arc<Address>,
    },
}

impl Change {
    /// Returns the kind of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::AddInterface { .. } => ChangeKind::AddInterface,
            Self::UpdateInterface { .. } => ChangeKind::UpdateInterface,
            Self::DeleteInterface { .. } => ChangeKind::DeleteInterface,
            Self::AddAddress { .. } => ChangeKind::AddAddress,
            Self::UpdateAddress { .. } => ChangeKind::UpdateAddress,
            Self::DeleteAddress { .. } => ChangeKind::DeleteAddress,
        }
    }

    /// Returns the id of the interface this change concerns.
    #[must_use]
    pub fn interface_id(&self) -> &str {
        match self {
            Self::AddInterface { info }
            | Self::UpdateInterface { info, .. }
            | Self::DeleteInterface { info } => &info.id,
            Self::AddAddress { address }
            | Self::UpdateAddress { address, .. }
            | Self::DeleteAddress { address } => &address.interface_id,
        }
    }

    /// Returns the address record for address-level changes.
    #[must_use]
    pub fn address(&self) -> Option<&Arc<Address>> {
        match self {
            Self::AddAddress { address }
            | Self::UpdateAddress { address, .. }
            | Self::DeleteAddress { address } => Some(address),
            _ => None,
        }
    }

    /// Returns the interface info for interface-level changes.
    #[must_use]
    pub fn info(&self) -> Option<&Arc<InterfaceInfo>> {
        match self {
            Self::AddInterface { info }
            | Self::UpdateInterface { info, .. }
            | Self::DeleteInterface { info } => Some(info),
            _ => None,
        }
    }

    /// Returns true for `add-*` changes.
    #[must_use]
    pub const fn is_add(&self) -> bool {
        matches!(self, Self::AddInterface { .. } | Self::AddAddress { .. })
    }

    /// Returns true for `delete-*` changes.
    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self, Self::DeleteInterface { .. } | Self::DeleteAddress { .. })
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Some(address) => write!(
                f,
                "{} {} {} on {}",
                self.kind(),
                address.family,
                address.address,
                address.interface_id
            ),
            None => write!(f, "{} {}", self.kind(), self.interface_id()),
        }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
