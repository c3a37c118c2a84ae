//! The authoritative in-memory interface and address store.
//!
//! This module provides:
//! - [`Store`]: interface records keyed by id, each owning its addresses keyed by address key
//! - The local-address index answering "is this address bound here" per family
//! - [`Store::apply`]: the single mutation entry point used by reconciliation
//!
//! Nothing here fails. Operations on absent keys are no-ops.

mod ordered;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use ordered::OrderedMap;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::monitor::{Address, Change, InterfaceInfo};
use crate::network::Family;

/// One interface and the addresses it currently holds.
#[derive(Debug, Clone)]
pub struct InterfaceRecord {
    info: Arc<InterfaceInfo>,
    addresses: OrderedMap<Arc<Address>>,
}

impl InterfaceRecord {
    fn new(info: Arc<InterfaceInfo>) -> Self {
        Self {
            info,
            addresses: OrderedMap::new(),
        }
    }

    /// Returns the interface info.
    #[must_use]
    pub const fn info(&self) -> &Arc<InterfaceInfo> {
        &self.info
    }

    /// Returns the interface id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// Returns the address stored under `key`.
    #[must_use]
    pub fn address(&self, key: &str) -> Option<&Arc<Address>> {
        self.addresses.get(key)
    }

    /// Iterates over the addresses in insertion order.
    pub fn addresses(&self) -> impl Iterator<Item = &Arc<Address>> {
        self.addresses.values()
    }

    /// Iterates over the address keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.addresses.keys()
    }

    /// Returns the number of addresses.
    #[must_use]
    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }
}

/// Interface records plus the derived active pointer and local-address index.
///
/// The local index counts bindings, so the same address string held by two
/// interfaces stays local until both release it.
#[derive(Debug, Clone, Default)]
pub struct Store {
    interfaces: OrderedMap<InterfaceRecord>,
    active: Option<String>,
    local: HashMap<Family, HashMap<String, usize>>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Returns true when no interface is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Returns the record of `interface_id`.
    #[must_use]
    pub fn get(&self, interface_id: &str) -> Option<&InterfaceRecord> {
        self.interfaces.get(interface_id)
    }

    /// Iterates over interface records in insertion order.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.values()
    }

    /// Iterates over interface ids in insertion order.
    pub fn interface_ids(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys()
    }

    /// Inserts a new interface or replaces the info of an existing one.
    ///
    /// Existing addresses are kept.
    pub fn upsert_interface(&mut self, info: Arc<InterfaceInfo>) {
        if info.active {
            self.active = Some(info.id.clone());
        } else if self.active.as_deref() == Some(info.id.as_str()) {
            self.active = None;
        }

        match self.interfaces.get_mut(&info.id) {
            Some(record) => record.info = info,
            None => {
                self.interfaces
                    .insert(info.id.clone(), InterfaceRecord::new(info));
            }
        }
    }

    /// Removes an interface with any addresses it still holds.
    pub fn remove_interface(&mut self, interface_id: &str) -> Option<InterfaceRecord> {
        let record = self.interfaces.remove(interface_id)?;
        for address in record.addresses() {
            self.unindex(address);
        }
        if self.active.as_deref() == Some(interface_id) {
            self.active = None;
        }
        Some(record)
    }

    /// Inserts or replaces an address under its owning interface.
    ///
    /// Returns false, leaving the store untouched, when the interface is unknown.
    pub fn upsert_address(&mut self, address: Arc<Address>) -> bool {
        let Some(record) = self.interfaces.get_mut(&address.interface_id) else {
            return false;
        };
        let previous = record
            .addresses
            .insert(address.key.clone(), Arc::clone(&address));
        if let Some(previous) = previous {
            self.unindex(&previous);
        }
        self.index(&address);
        true
    }

    /// Removes the address stored under `key` on `interface_id`.
    pub fn remove_address(&mut self, interface_id: &str, key: &str) -> Option<Arc<Address>> {
        let removed = self.interfaces.get_mut(interface_id)?.addresses.remove(key)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Returns the record of the interface flagged active.
    #[must_use]
    pub fn current_active(&self) -> Option<&InterfaceRecord> {
        self.active.as_deref().and_then(|id| self.interfaces.get(id))
    }

    /// Returns the set of address strings of `family` bound to any interface.
    #[must_use]
    pub fn local_addresses(&self, family: Family) -> HashSet<&str> {
        self.local
            .get(&family)
            .map(|addresses| addresses.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true when `address` of `family` is bound to any interface.
    #[must_use]
    pub fn is_local(&self, family: Family, address: &str) -> bool {
        self.local
            .get(&family)
            .is_some_and(|addresses| addresses.contains_key(address))
    }

    /// Returns the first internal address of `family` in store order.
    #[must_use]
    pub fn first_internal(&self, family: Family) -> Option<&Arc<Address>> {
        self.interfaces()
            .flat_map(InterfaceRecord::addresses)
            .find(|address| address.family == family && address.internal)
    }

    /// Lazily replays the store as `add-interface` / `add-address` changes.
    ///
    /// Every call restarts from the first interface.
    pub fn changes(&self) -> impl Iterator<Item = Change> + '_ {
        self.interfaces().flat_map(|record| {
            std::iter::once(Change::AddInterface {
                info: Arc::clone(&record.info),
            })
            .chain(record.addresses().map(|address| Change::AddAddress {
                address: Arc::clone(address),
            }))
        })
    }

    /// Applies one change, returning whether it took effect.
    ///
    /// `update-address` is dropped when the stored address is no longer the
    /// exact record the update was planned against. Interface updates and
    /// address changes for unknown interfaces are dropped as well.
    pub fn apply(&mut self, change: &Change) -> bool {
        match change {
            Change::AddInterface { info } => {
                self.upsert_interface(Arc::clone(info));
                true
            }
            Change::UpdateInterface { info, .. } => {
                if !self.interfaces.contains_key(&info.id) {
                    return false;
                }
                self.upsert_interface(Arc::clone(info));
                true
            }
            Change::DeleteInterface { info } => self.remove_interface(&info.id).is_some(),
            Change::AddAddress { address } => self.upsert_address(Arc::clone(address)),
            Change::UpdateAddress {
                address,
                old_address,
            } => {
                let current = self
                    .get(&address.interface_id)
                    .and_then(|record| record.address(&address.key));
                if !current.is_some_and(|current| Arc::ptr_eq(current, old_address)) {
                    trace!(key = %address.key, "Dropping stale address update");
                    return false;
                }
                self.upsert_address(Arc::clone(address))
            }
            Change::DeleteAddress { address } => self
                .remove_address(&address.interface_id, &address.key)
                .is_some(),
        }
    }

    fn index(&mut self, address: &Address) {
        *self
            .local
            .entry(address.family)
            .or_default()
            .entry(address.address.clone())
            .or_default() += 1;
    }

    fn unindex(&mut self, address: &Address) {
        let Some(addresses) = self.local.get_mut(&address.family) else {
            return;
        };
        if let Some(count) = addresses.get_mut(&address.address) {
            *count -= 1;
            if *count == 0 {
                addresses.remove(&address.address);
            }
        }
    }
}
