//! Reconciliation: diffing a fresh enumeration against the [`Store`].
//!
//! A pass is split in two phases so callers control when the store is
//! mutated:
//! - [`plan`] computes the ordered change list against a read-only store
//! - [`Store::apply`] applies each change, dropping stale address updates
//!
//! [`reconcile`] runs both phases back to back.
//!
//! Ordering of the planned changes:
//! 1. Surviving interfaces in enumeration order. For each one, the
//!    interface add/update, then address adds/updates, then address deletes.
//! 2. Vanished interfaces in store order. For each one, every address
//!    delete, then the interface delete.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{trace, warn};

use super::address::{Address, InterfaceInfo};
use super::change::Change;
use super::error::Warning;
use crate::network::{NicTypes, RawInterface};
use crate::state::{InterfaceRecord, Store};

/// The outcome of planning (or running) one reconciliation pass.
#[derive(Debug, Default)]
pub struct Plan {
    /// Changes in emission order.
    pub changes: Vec<Change>,
    /// Recoverable anomalies found while planning.
    pub warnings: Vec<Warning>,
}

impl Plan {
    /// Returns true when the pass found no differences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Computes the ordered changes that bring `store` in line with `interfaces`.
///
/// `active_id` and `nic_types` are the auxiliary lookup results for this
/// pass; `None` means unknown. The store is not modified.
#[must_use]
pub fn plan(
    store: &Store,
    interfaces: Vec<RawInterface>,
    active_id: Option<&str>,
    nic_types: Option<&NicTypes>,
) -> Plan {
    let mut plan = Plan::default();
    let mut seen = HashSet::with_capacity(interfaces.len());

    for raw in interfaces {
        if !seen.insert(raw.id.clone()) {
            trace!(interface = %raw.id, "Ignoring repeated interface id");
            continue;
        }
        let info = InterfaceInfo::derive(&raw.id, active_id, nic_types);
        plan_interface(&mut plan, store.get(&raw.id), info, raw);
    }

    for record in store.interfaces().filter(|record| !seen.contains(record.id())) {
        plan_vanished(&mut plan, record);
    }

    plan
}

/// Plans one pass and applies it to `store`.
///
/// Only changes that took effect are returned.
pub fn reconcile(
    store: &mut Store,
    interfaces: Vec<RawInterface>,
    active_id: Option<&str>,
    nic_types: Option<&NicTypes>,
) -> Plan {
    let mut plan = plan(store, interfaces, active_id, nic_types);
    plan.changes.retain(|change| store.apply(change));
    plan
}

fn plan_interface(
    plan: &mut Plan,
    existing: Option<&InterfaceRecord>,
    info: InterfaceInfo,
    raw: RawInterface,
) {
    let info = Arc::new(info);
    match existing {
        None => plan.changes.push(Change::AddInterface {
            info: Arc::clone(&info),
        }),
        Some(record) if record.info().hash != info.hash => {
            plan.changes.push(Change::UpdateInterface {
                info: Arc::clone(&info),
                old_info: Arc::clone(record.info()),
            });
        }
        Some(_) => {}
    }

    let mut kept: HashMap<String, Arc<Address>> = HashMap::with_capacity(raw.addresses.len());
    for raw_address in raw.addresses {
        let address = Arc::new(Address::normalize(&info.id, raw_address));
        if let Some(first) = kept.get(&address.key) {
            let warning = Warning::duplicate_key(first, &address);
            warn!(interface = %info.id, key = %address.key, "{}", warning.message);
            plan.warnings.push(warning);
            continue;
        }
        kept.insert(address.key.clone(), Arc::clone(&address));

        match existing.and_then(|record| record.address(&address.key)) {
            None => plan.changes.push(Change::AddAddress { address }),
            Some(old) if old.hash != address.hash => {
                plan.changes.push(Change::UpdateAddress {
                    address,
                    old_address: Arc::clone(old),
                });
            }
            Some(_) => {}
        }
    }

    if let Some(record) = existing {
        for old in record.addresses().filter(|old| !kept.contains_key(&old.key)) {
            plan.changes.push(Change::DeleteAddress {
                address: Arc::clone(old),
            });
        }
    }
}

fn plan_vanished(plan: &mut Plan, record: &InterfaceRecord) {
    for address in record.addresses() {
        plan.changes.push(Change::DeleteAddress {
            address: Arc::clone(address),
        });
    }
    plan.changes.push(Change::DeleteInterface {
        info: Arc::clone(record.info()),
    });
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
