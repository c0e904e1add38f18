// crates/topology-core/tests/synchronizer.rs
// ============================================================================
// Module: Derived Field Synchronizer Tests
// Description: Leader reselection and component server list reconciliation.
// Purpose: Ensure derived fields follow address edits without losing choices.
// ============================================================================

//! Derived field synchronization tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::cluster_engine;
use common::oms_engine;
use common::table_with;
use topology_core::AddressSet;
use topology_core::ComponentId;
use topology_core::ComponentServers;
use topology_core::DeploymentMode;
use topology_core::LeaderChange;
use topology_core::LeaderMode;
use topology_core::ServerCardinality;
use topology_core::StandardHostSyntax;
use topology_core::Zone;
use topology_core::ZoneId;
use topology_core::ZonePatch;
use topology_core::sync_leader;

fn addresses(values: &[&str]) -> AddressSet {
    AddressSet::normalize(values, &StandardHostSyntax).unwrap()
}

#[test]
fn removing_the_leader_reselects_the_first_remaining_address() {
    let engine = cluster_engine();
    let (state, ids) = table_with(&engine, &[&["10.0.0.1", "10.0.0.2"]]);
    let a = ids[0];
    assert_eq!(state.table.get(a).unwrap().leader.as_deref(), Some("10.0.0.1"));

    let outcome = engine
        .update_zone(
            &state.table,
            a,
            &ZonePatch::addresses(["10.0.0.2"]),
            &state.annotations,
            &state.history,
        )
        .unwrap();

    assert_eq!(outcome.table.get(a).unwrap().leader.as_deref(), Some("10.0.0.2"));
    assert_eq!(
        outcome.sync.leaders,
        vec![(
            a,
            LeaderChange::Reselected {
                previous: Some("10.0.0.1".to_string()),
                leader: "10.0.0.2".to_string(),
            }
        )]
    );
    assert!(outcome.annotations.is_empty());
}

#[test]
fn member_leader_is_kept() {
    let engine = cluster_engine();
    let (mut state, ids) = table_with(&engine, &[&["10.0.0.1", "10.0.0.2"]]);
    let a = ids[0];
    state.apply(&engine, a, &ZonePatch::leader(Some("10.0.0.2".to_string())));
    state.set_addresses(&engine, a, &["10.0.0.3", "10.0.0.2"]);
    assert_eq!(state.table.get(a).unwrap().leader.as_deref(), Some("10.0.0.2"));
}

#[test]
fn emptied_zone_clears_its_leader() {
    let engine = cluster_engine();
    let (mut state, ids) = table_with(&engine, &[&["10.0.0.1"]]);
    let a = ids[0];
    state.set_addresses(&engine, a, &[]);
    assert!(state.table.get(a).unwrap().leader.is_none());
}

#[test]
fn access_url_keeps_scheme_and_port() {
    let engine = oms_engine();
    let (mut state, ids) = table_with(&engine, &[&["10.0.0.1"]]);
    let a = ids[0];
    state.apply(&engine, a, &ZonePatch::leader(Some("https://10.0.0.1:9443".to_string())));
    state.set_addresses(&engine, a, &["10.0.0.5"]);
    assert_eq!(state.table.get(a).unwrap().leader.as_deref(), Some("https://10.0.0.5:9443"));
}

#[test]
fn disabled_leader_is_never_touched() {
    let mut mode = DeploymentMode::cluster();
    mode.leader = LeaderMode::Disabled;
    let mut zone = Zone::new(ZoneId::new(1), "zone1");
    zone.addresses = addresses(&["10.0.0.1"]);
    assert_eq!(sync_leader(&mut zone, &mode), LeaderChange::Kept);
    assert!(zone.leader.is_none());
}

#[test]
fn server_list_edit_tracks_custom_entries() {
    let mut list = ComponentServers::new(ComponentId::from("proxy"), ServerCardinality::Multiple);
    list.edit(&["10.0.0.2", " custom.host ", "10.0.0.2"], &addresses(&["10.0.0.1", "10.0.0.2"]));
    assert_eq!(list.selected(), &["10.0.0.2".to_string(), "custom.host".to_string()]);
    assert!(list.custom().contains("custom.host"));

    assert!(list.sync(&addresses(&["10.0.0.1"])));
    assert_eq!(list.selected(), &["custom.host".to_string()]);
}

#[test]
fn emptied_server_list_falls_back_to_first_address() {
    let mut list = ComponentServers::new(ComponentId::from("agent"), ServerCardinality::Multiple);
    assert!(!list.sync(&AddressSet::new()));
    assert!(list.selected().is_empty());

    assert!(list.sync(&addresses(&["10.0.0.7", "10.0.0.8"])));
    assert_eq!(list.selected(), &["10.0.0.7".to_string()]);

    list.edit(&["10.0.0.8"], &addresses(&["10.0.0.7", "10.0.0.8"]));
    assert!(list.sync(&addresses(&["10.0.0.7"])));
    assert_eq!(list.selected(), &["10.0.0.7".to_string()]);
}

#[test]
fn single_server_lists_keep_one_entry() {
    let mut list =
        ComponentServers::new(ComponentId::from("config-server"), ServerCardinality::Single);
    let available = addresses(&["10.0.0.1", "10.0.0.2"]);
    list.edit(&["10.0.0.1", "10.0.0.2"], &available);
    assert_eq!(list.selected(), &["10.0.0.2".to_string()]);
    assert!(!list.sync(&available));
}

#[test]
fn custom_entry_stops_being_custom_once_a_zone_holds_it() {
    let mut list = ComponentServers::new(ComponentId::from("proxy"), ServerCardinality::Multiple);
    list.edit(&["10.0.0.9"], &addresses(&["10.0.0.1"]));
    assert!(list.custom().contains("10.0.0.9"));

    assert!(!list.sync(&addresses(&["10.0.0.1", "10.0.0.9"])));
    assert!(list.custom().is_empty());

    assert!(list.sync(&addresses(&["10.0.0.1"])));
    assert_eq!(list.selected(), &["10.0.0.1".to_string()]);
}
