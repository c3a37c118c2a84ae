//! Tests for reconciliation.

use super::*;
use crate::monitor::{ChangeKind, WarningCode};
use crate::network::{Family, NicType, RawAddress};

use ChangeKind::{AddAddress, AddInterface, DeleteAddress, DeleteInterface, UpdateAddress, UpdateInterface};

fn v4(address: &str, mac: &str) -> RawAddress {
    RawAddress::new(address, Family::IPv4).with_mac(mac)
}

fn v6(address: &str, mac: &str, scopeid: u32) -> RawAddress {
    RawAddress::new(address, Family::IPv6)
        .with_mac(mac)
        .with_scopeid(scopeid)
}

fn iface(id: &str, addresses: Vec<RawAddress>) -> RawInterface {
    RawInterface::new(id, addresses)
}

fn kinds(plan: &Plan) -> Vec<ChangeKind> {
    plan.changes.iter().map(Change::kind).collect()
}

fn run(store: &mut Store, interfaces: Vec<RawInterface>) -> Plan {
    reconcile(store, interfaces, None, Some(&NicTypes::new()))
}

mod scenarios {
    use super::*;

    #[test]
    fn first_pass_adds_interface_then_address() {
        let mut store = Store::new();
        let plan = run(&mut store, vec![iface("lo", vec![v4("127.0.0.1", "do")])]);

        assert_eq!(kinds(&plan), [AddInterface, AddAddress]);
        let info = plan.changes[0].info().unwrap();
        assert!(!info.active);
        assert_eq!(info.nic_type, NicType::Other);
        assert_eq!(plan.changes[1].address().unwrap().interface_id, "lo");
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn identical_second_pass_is_silent() {
        let mut store = Store::new();
        let input = vec![iface("lo", vec![v4("127.0.0.1", "do")])];
        run(&mut store, input.clone());

        assert!(run(&mut store, input).is_empty());
    }

    #[test]
    fn vanished_interface_deletes_addresses_then_itself() {
        let mut store = Store::new();
        run(
            &mut store,
            vec![iface("lo", vec![v4("127.0.0.1", "do"), v6("::1", "do", 0)])],
        );

        let plan = run(&mut store, vec![]);

        assert_eq!(kinds(&plan), [DeleteAddress, DeleteAddress, DeleteInterface]);
        assert!(store.is_empty());
    }

    #[test]
    fn changed_value_under_same_key_updates() {
        let mut store = Store::new();
        run(&mut store, vec![iface("eth0", vec![v4("10.0.0.5", "aa")])]);

        let plan = run(&mut store, vec![iface("eth0", vec![v4("10.0.0.6", "aa")])]);

        assert_eq!(kinds(&plan), [UpdateAddress]);
        let Change::UpdateAddress {
            address,
            old_address,
        } = &plan.changes[0]
        else {
            panic!("expected update-address");
        };
        assert_eq!(address.key, old_address.key);
        assert_eq!(old_address.address, "10.0.0.5");
        assert_eq!(address.address, "10.0.0.6");
        assert!(store.is_local(Family::IPv4, "10.0.0.6"));
        assert!(!store.is_local(Family::IPv4, "10.0.0.5"));
    }
}

mod interface_info {
    use super::*;

    #[test]
    fn active_flip_alone_updates_interface() {
        let mut store = Store::new();
        let input = vec![iface("eth0", vec![])];
        run(&mut store, input.clone());

        let plan = reconcile(&mut store, input, Some("eth0"), None);

        assert_eq!(kinds(&plan), [UpdateInterface]);
        let Change::UpdateInterface { info, old_info } = &plan.changes[0] else {
            panic!("expected update-interface");
        };
        assert!(info.active);
        assert!(!old_info.active);
        assert_eq!(store.current_active().unwrap().id(), "eth0");
    }

    #[test]
    fn nic_type_change_updates_interface() {
        let mut store = Store::new();
        run(&mut store, vec![iface("wlan0", vec![])]);

        let types: NicTypes = [("wlan0".to_string(), NicType::Wireless)].into();
        let plan = reconcile(&mut store, vec![iface("wlan0", vec![])], None, Some(&types));

        assert_eq!(kinds(&plan), [UpdateInterface]);
        assert_eq!(
            store.get("wlan0").unwrap().info().nic_type,
            NicType::Wireless
        );
    }

    #[test]
    fn active_moves_between_interfaces() {
        let mut store = Store::new();
        let input = vec![iface("eth0", vec![]), iface("wlan0", vec![])];
        reconcile(&mut store, input.clone(), Some("eth0"), None);

        let plan = reconcile(&mut store, input, Some("wlan0"), None);

        assert_eq!(kinds(&plan), [UpdateInterface, UpdateInterface]);
        assert_eq!(store.current_active().unwrap().id(), "wlan0");
    }
}

mod ordering {
    use super::*;

    #[test]
    fn interface_event_precedes_its_address_events() {
        let mut store = Store::new();
        run(&mut store, vec![iface("eth0", vec![v4("10.0.0.5", "aa")])]);

        let plan = reconcile(
            &mut store,
            vec![iface(
                "eth0",
                vec![v4("10.0.0.6", "aa"), v6("fe80::1", "aa", 2)],
            )],
            Some("eth0"),
            None,
        );

        assert_eq!(kinds(&plan), [UpdateInterface, UpdateAddress, AddAddress]);
    }

    #[test]
    fn address_adds_precede_address_deletes() {
        let mut store = Store::new();
        run(&mut store, vec![iface("eth0", vec![v4("10.0.0.5", "aa")])]);

        // New MAC gives a new key: the old slot goes away, a new one appears.
        let plan = run(&mut store, vec![iface("eth0", vec![v4("10.0.0.5", "bb")])]);

        assert_eq!(kinds(&plan), [AddAddress, DeleteAddress]);
        assert!(store.is_local(Family::IPv4, "10.0.0.5"));
    }

    #[test]
    fn survivors_precede_vanished_interfaces() {
        let mut store = Store::new();
        run(
            &mut store,
            vec![
                iface("old", vec![v4("10.0.0.1", "o")]),
                iface("eth0", vec![]),
            ],
        );

        let plan = run(
            &mut store,
            vec![iface("eth0", vec![v4("10.0.0.2", "e")]), iface("new", vec![])],
        );

        assert_eq!(
            kinds(&plan),
            [AddAddress, AddInterface, DeleteAddress, DeleteInterface]
        );
        assert_eq!(plan.changes[3].interface_id(), "old");
    }

    #[test]
    fn enumeration_order_drives_event_order() {
        let mut store = Store::new();
        let plan = run(&mut store, vec![iface("b", vec![]), iface("a", vec![])]);

        let ids: Vec<_> = plan.changes.iter().map(Change::interface_id).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn repeated_interface_id_is_ignored() {
        let mut store = Store::new();
        let plan = run(
            &mut store,
            vec![
                iface("eth0", vec![v4("10.0.0.5", "aa")]),
                iface("eth0", vec![]),
            ],
        );

        assert_eq!(kinds(&plan), [AddInterface, AddAddress]);
        assert_eq!(store.get("eth0").unwrap().address_count(), 1);
    }
}

mod duplicates {
    use super::*;

    #[test]
    fn first_entry_wins_with_one_warning() {
        let mut store = Store::new();
        let plan = run(
            &mut store,
            vec![iface(
                "eth0",
                vec![v4("10.0.0.5", "aa"), v4("10.0.0.99", "aa")],
            )],
        );

        assert_eq!(kinds(&plan), [AddInterface, AddAddress]);
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.warnings[0].code, WarningCode::DuplicateKey);
        assert_eq!(plan.warnings[0].interface_id.as_deref(), Some("eth0"));
        let kept = plan.warnings[0].kept.as_ref().unwrap();
        let dropped = plan.warnings[0].dropped.as_ref().unwrap();
        assert_eq!(kept.address, "10.0.0.5");
        assert_eq!(dropped.address, "10.0.0.99");
        assert_eq!(kept.key, dropped.key);
        assert!(plan.warnings[0].cause.is_some());
        assert!(store.is_local(Family::IPv4, "10.0.0.5"));
        assert!(!store.is_local(Family::IPv4, "10.0.0.99"));
    }

    #[test]
    fn same_key_on_other_interfaces_is_fine() {
        let mut store = Store::new();
        let plan = run(
            &mut store,
            vec![
                iface("eth0", vec![v4("10.0.0.5", "aa")]),
                iface("eth1", vec![v4("10.0.0.5", "aa")]),
            ],
        );

        assert!(plan.warnings.is_empty());
        assert_eq!(kinds(&plan).len(), 4);
    }

    #[test]
    fn distinct_scopeids_do_not_collide() {
        let mut store = Store::new();
        let plan = run(
            &mut store,
            vec![iface(
                "eth0",
                vec![v6("fe80::1", "aa", 2), v6("2001:db8::1", "aa", 0)],
            )],
        );

        assert!(plan.warnings.is_empty());
        assert_eq!(store.get("eth0").unwrap().address_count(), 2);
    }
}

mod properties {
    use super::*;

    fn history() -> Vec<Vec<RawInterface>> {
        vec![
            vec![
                iface("lo", vec![v4("127.0.0.1", "00").internal()]),
                iface("eth0", vec![v4("10.0.0.5", "aa")]),
            ],
            vec![
                iface("lo", vec![v4("127.0.0.1", "00").internal()]),
                iface("eth0", vec![v4("10.0.0.6", "aa"), v6("fe80::1", "aa", 2)]),
                iface("wlan0", vec![v4("192.168.1.4", "cc")]),
            ],
            vec![
                iface("lo", vec![v4("127.0.0.1", "00").internal()]),
                iface("wlan0", vec![v4("192.168.1.5", "cc")]),
            ],
        ]
    }

    #[test]
    fn live_events_replayed_on_empty_store_reproduce_state() {
        let mut store = Store::new();
        let mut observed = Vec::new();
        for input in history() {
            observed.extend(run(&mut store, input).changes);
        }

        let mut replica = Store::new();
        for change in &observed {
            assert!(replica.apply(change), "replica rejected {change}");
        }

        assert_eq!(
            replica.changes().collect::<Vec<_>>(),
            store.changes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn snapshot_then_live_matches_source() {
        let mut store = Store::new();
        let mut history = history().into_iter();
        for input in history.by_ref().take(2) {
            run(&mut store, input);
        }

        let mut replica = Store::new();
        for change in store.changes() {
            replica.apply(&change);
        }
        for input in history {
            for change in run(&mut store, input).changes {
                replica.apply(&change);
            }
        }

        assert_eq!(
            replica.changes().collect::<Vec<_>>(),
            store.changes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn every_pass_is_idempotent() {
        let mut store = Store::new();
        for input in history() {
            run(&mut store, input.clone());
            assert!(run(&mut store, input).is_empty());
        }
    }

    #[test]
    fn plan_leaves_store_untouched() {
        let store = Store::new();
        let plan = plan(&store, history().remove(0), None, None);

        assert!(!plan.is_empty());
        assert!(store.is_empty());
    }
}

mod interleaving {
    use super::*;

    /// Documents the stale-write guard: when two passes are planned against
    /// the same store and the later plan is applied first, the earlier plan's
    /// update of the same slot is dropped. The newer value is kept, and no
    /// warning is raised.
    #[test]
    fn overlapping_update_of_same_slot_is_dropped() {
        let mut store = Store::new();
        run(&mut store, vec![iface("eth0", vec![v4("10.0.0.5", "aa")])]);

        let slow = plan(&store, vec![iface("eth0", vec![v4("10.0.0.6", "aa")])], None, None);
        let fast = plan(&store, vec![iface("eth0", vec![v4("10.0.0.7", "aa")])], None, None);

        for change in &fast.changes {
            assert!(store.apply(change));
        }
        let applied: Vec<_> = slow
            .changes
            .iter()
            .filter(|change| store.apply(change))
            .collect();

        assert!(applied.is_empty());
        assert!(store.is_local(Family::IPv4, "10.0.0.7"));
        assert!(!store.is_local(Family::IPv4, "10.0.0.6"));
        assert!(slow.warnings.is_empty());
    }

    /// Only identity is checked: an overlapping add for a slot the other
    /// pass already filled still overwrites it.
    #[test]
    fn overlapping_adds_last_writer_wins() {
        let mut store = Store::new();
        run(&mut store, vec![iface("eth0", vec![])]);

        let first = plan(&store, vec![iface("eth0", vec![v4("10.0.0.1", "aa")])], None, None);
        let second = plan(&store, vec![iface("eth0", vec![v4("10.0.0.2", "aa")])], None, None);

        for change in second.changes.iter().chain(&first.changes) {
            store.apply(change);
        }

        assert!(store.is_local(Family::IPv4, "10.0.0.1"));
        assert!(!store.is_local(Family::IPv4, "10.0.0.2"));
    }
}
