// crates/topology-core/tests/table_lifecycle.rs
// ============================================================================
// Module: Table Lifecycle Tests
// Description: Row add/delete, default flag and saved payload loading.
// Purpose: Ensure structural invariants hold across lifecycle operations.
// ============================================================================

//! Topology table lifecycle tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::TableState;
use common::cluster_engine;
use common::oms_engine;
use topology_core::AddressHistory;
use topology_core::DeploymentMode;
use topology_core::StandardHostSyntax;
use topology_core::StructuralRefusal;
use topology_core::TopologyEngine;
use topology_core::TopologyError;
use topology_core::TopologyPayload;
use topology_core::ZoneField;
use topology_core::ZoneId;
use topology_core::ZonePatch;
use topology_core::ZonePayload;

fn default_count(state: &TableState) -> usize {
    state.table.zones().iter().filter(|zone| zone.is_default).count()
}

#[test]
fn initial_table_has_one_pristine_default_zone() {
    let engine = cluster_engine();
    let table = engine.initial_table();
    assert_eq!(table.len(), 1);
    let zone = &table.zones()[0];
    assert_eq!(zone.name, "zone1");
    assert!(zone.is_default);
    assert!(zone.is_pristine());
    assert!(engine.validate(&table, &AddressHistory::new(), false).is_empty());
}

#[test]
fn oms_rows_use_default_prefix() {
    let engine = oms_engine();
    let mut state = TableState::initial(&engine);
    let id = state.add(&engine);
    assert_eq!(state.table.zones()[0].name, "default-1");
    assert_eq!(state.table.get(id).unwrap().name, "default-2");
}

#[test]
fn new_names_skip_past_largest_suffix() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let second = state.add(&engine);
    state.apply(&engine, second, &ZonePatch::name("zone7"));
    let third = state.add(&engine);
    assert_eq!(state.table.get(third).unwrap().name, "zone8");

    state.apply(&engine, second, &ZonePatch::name("alpha"));
    let fourth = state.add(&engine);
    assert_eq!(state.table.get(fourth).unwrap().name, "zone9");
}

#[test]
fn new_names_skip_suffixes_that_cannot_grow() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let first = state.table.zones()[0].id;
    state.apply(&engine, first, &ZonePatch::name("zone18446744073709551615"));
    assert!(state.errors(first, ZoneField::Name).is_empty());

    let second = state.add(&engine);
    assert_eq!(state.table.get(second).unwrap().name, "zone1");
    let third = state.add(&engine);
    assert_eq!(state.table.get(third).unwrap().name, "zone2");

    state.apply(&engine, second, &ZonePatch::name("zone18446744073709551614"));
    let fourth = state.add(&engine);
    assert_eq!(state.table.get(fourth).unwrap().name, "zone1");
}

#[test]
fn added_zone_does_not_steal_default() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let second = state.add(&engine);
    assert!(!state.table.get(second).unwrap().is_default);
    assert_eq!(default_count(&state), 1);
}

#[test]
fn deleting_last_zone_is_refused() {
    let engine = cluster_engine();
    let state = TableState::initial(&engine);
    let only = state.table.zones()[0].id;
    assert!(!state.table.can_delete(engine.mode(), only));
    let err = engine.delete_zone(&state.table, only).unwrap_err();
    assert_eq!(
        err,
        TopologyError::Refused(StructuralRefusal::LastZone {
            min: 1
        })
    );
}

#[test]
fn deleting_unknown_zone_is_rejected() {
    let engine = cluster_engine();
    let state = TableState::initial(&engine);
    let err = engine.delete_zone(&state.table, ZoneId::new(42)).unwrap_err();
    assert_eq!(err, TopologyError::UnknownZone(ZoneId::new(42)));
}

#[test]
fn deleting_default_promotes_first_remaining_zone() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let first = state.table.zones()[0].id;
    let second = state.add(&engine);
    let third = state.add(&engine);
    state.delete(&engine, first);
    assert!(state.table.get(second).unwrap().is_default);
    assert!(!state.table.get(third).unwrap().is_default);
    assert_eq!(default_count(&state), 1);
}

#[test]
fn identifiers_are_never_reused() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let second = state.add(&engine);
    state.delete(&engine, second);
    let third = state.add(&engine);
    assert_ne!(second, third);
    assert_eq!(third, ZoneId::new(3));
}

#[test]
fn setting_default_clears_every_other_row() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let first = state.table.zones()[0].id;
    let second = state.add(&engine);
    state.apply(&engine, second, &ZonePatch::is_default(true));
    assert!(state.table.get(second).unwrap().is_default);
    assert!(!state.table.get(first).unwrap().is_default);
    assert_eq!(default_count(&state), 1);
}

#[test]
fn clearing_only_default_is_refused() {
    let engine = cluster_engine();
    let state = TableState::initial(&engine);
    let first = state.table.zones()[0].id;
    assert!(!state.table.can_clear_default(engine.mode(), first));
    let err = engine
        .update_zone(
            &state.table,
            first,
            &ZonePatch::is_default(false),
            &state.annotations,
            &state.history,
        )
        .unwrap_err();
    assert_eq!(err, TopologyError::Refused(StructuralRefusal::DefaultRequired));
}

#[test]
fn single_node_mode_caps_rows_and_ignores_default() {
    let engine = TopologyEngine::new(DeploymentMode::single_node(), StandardHostSyntax);
    let mut state = TableState::initial(&engine);
    assert!(!state.table.can_add(engine.mode()));
    let err = engine.add_zone(&state.table).unwrap_err();
    assert_eq!(
        err,
        StructuralRefusal::MaxZones {
            max: 1
        }
    );
    let only = state.table.zones()[0].id;
    state.apply(&engine, only, &ZonePatch::is_default(false));
    assert!(!state.table.get(only).unwrap().is_default);
}

#[test]
fn initial_table_seeds_the_minimum_row_count() {
    let mode = DeploymentMode {
        min_zones: 3,
        ..DeploymentMode::cluster()
    };
    let engine = TopologyEngine::new(mode, StandardHostSyntax);
    let table = engine.initial_table();
    let names: Vec<&str> = table.zones().iter().map(|zone| zone.name.as_str()).collect();
    assert_eq!(names, vec!["zone1", "zone2", "zone3"]);
    assert_eq!(table.zones().iter().filter(|zone| zone.is_default).count(), 1);
    assert!(table.zones()[0].is_default);
    assert!(table.zones().iter().all(|zone| zone.is_pristine()));
    assert!(table.zones().iter().all(|zone| !table.can_delete(engine.mode(), zone.id)));
    assert!(engine.validate(&table, &AddressHistory::new(), false).is_empty());

    let mut state = TableState::initial(&engine);
    let fourth = state.add(&engine);
    assert_eq!(state.table.get(fourth).unwrap().name, "zone4");
    assert!(state.table.can_delete(engine.mode(), fourth));
}

#[test]
fn load_pads_short_payloads_to_the_minimum() {
    let mode = DeploymentMode {
        min_zones: 3,
        ..DeploymentMode::cluster()
    };
    let engine = TopologyEngine::new(mode, StandardHostSyntax);
    let payload = TopologyPayload {
        zones: vec![ZonePayload {
            name: "zone2".to_string(),
            addresses: vec!["10.0.0.1".to_string()],
            leader: Some("10.0.0.1".to_string()),
            cm_url: None,
            is_default: false,
        }],
    };
    let table = engine.load(&payload).unwrap();
    let names: Vec<&str> = table.zones().iter().map(|zone| zone.name.as_str()).collect();
    assert_eq!(names, vec!["zone2", "zone3", "zone4"]);
    assert!(table.zones()[0].is_default);
    assert_eq!(table.zones().iter().filter(|zone| zone.is_default).count(), 1);

    let empty = engine.load(&TopologyPayload::default()).unwrap();
    assert_eq!(empty.len(), 3);
}

#[test]
fn load_refuses_more_zones_than_the_mode_allows() {
    let engine = TopologyEngine::new(DeploymentMode::single_node(), StandardHostSyntax);
    let zone = |name: &str, address: &str| ZonePayload {
        name: name.to_string(),
        addresses: vec![address.to_string()],
        leader: Some(address.to_string()),
        cm_url: None,
        is_default: false,
    };
    let payload = TopologyPayload {
        zones: vec![
            zone("zone1", "10.0.0.1"),
            zone("zone2", "10.0.0.2"),
            zone("zone3", "10.0.0.3"),
        ],
    };
    let err = engine.load(&payload).unwrap_err();
    assert_eq!(
        err,
        StructuralRefusal::MaxZones {
            max: 1
        }
    );

    let single = TopologyPayload {
        zones: payload.zones[..1].to_vec(),
    };
    let table = engine.load(&single).unwrap();
    assert_eq!(table.len(), 1);
    assert!(engine.validate(&table, &AddressHistory::new(), true).is_empty());
}

#[test]
fn edits_bump_revision() {
    let engine = cluster_engine();
    let mut state = TableState::initial(&engine);
    let first = state.table.zones()[0].id;
    state.set_addresses(&engine, first, &["10.0.0.1"]);
    state.apply(&engine, first, &ZonePatch::name("zone_a"));
    assert_eq!(state.table.get(first).unwrap().revision, 2);
}

#[test]
fn load_repairs_default_flag_and_reads_either_leader_key() {
    let engine = oms_engine();
    let payload = TopologyPayload {
        zones: vec![
            ZonePayload {
                name: "default-1".to_string(),
                addresses: vec!["10.0.0.1".to_string()],
                leader: None,
                cm_url: Some("http://10.0.0.1:8088".to_string()),
                is_default: true,
            },
            ZonePayload {
                name: "default-2".to_string(),
                addresses: vec!["10.0.0.2".to_string()],
                leader: Some("http://10.0.0.2:8088".to_string()),
                cm_url: None,
                is_default: true,
            },
        ],
    };
    let table = engine.load(&payload).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.zones().iter().filter(|zone| zone.is_default).count(), 1);
    assert!(table.zones()[0].is_default);
    assert_eq!(table.zones()[1].leader.as_deref(), Some("http://10.0.0.2:8088"));
    assert!(table.zones().iter().all(|zone| zone.is_pristine()));

    let round_trip = TopologyPayload::from_table(&table, engine.mode());
    assert_eq!(round_trip.zones[0].cm_url.as_deref(), Some("http://10.0.0.1:8088"));
    assert!(round_trip.zones[0].leader.is_none());
}

#[test]
fn load_of_empty_payload_yields_initial_table() {
    let engine = cluster_engine();
    let table = engine.load(&TopologyPayload::default()).unwrap();
    assert_eq!(table, engine.initial_table());
}
