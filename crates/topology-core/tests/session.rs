// crates/topology-core/tests/session.rs
// ============================================================================
// Module: Wizard Session Tests
// Description: Event handling, name checks, component lists and submission.
// Purpose: Ensure the session keeps state consistent across event sequences.
// ============================================================================

//! Wizard session tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use common::RecordingAuditSink;
use common::cluster_session;
use topology_core::AuditAction;
use topology_core::AuditOutcome;
use topology_core::ComponentGraph;
use topology_core::ComponentId;
use topology_core::ComponentPayload;
use topology_core::ComponentServersEvent;
use topology_core::DeploymentMode;
use topology_core::DeploymentPayload;
use topology_core::EventOutcome;
use topology_core::FieldError;
use topology_core::LeaderChange;
use topology_core::NameTarget;
use topology_core::ProgrammaticChange;
use topology_core::RawValue;
use topology_core::RowDeleteEvent;
use topology_core::RowEditEvent;
use topology_core::ServerCardinality;
use topology_core::StandardHostSyntax;
use topology_core::StructuralRefusal;
use topology_core::SubmitError;
use topology_core::TopologyEngine;
use topology_core::TopologyError;
use topology_core::TopologyPayload;
use topology_core::WizardEvent;
use topology_core::WizardSession;
use topology_core::ZoneField;
use topology_core::ZoneId;
use topology_core::ZonePatch;
use topology_core::ZonePayload;

type TestResult = Result<(), String>;

fn edit(zone_id: ZoneId, field: ZoneField, raw_value: RawValue) -> WizardEvent {
    WizardEvent::RowEdit(RowEditEvent {
        zone_id,
        field,
        raw_value,
    })
}

#[test]
fn address_text_edit_sets_leader_programmatically() -> TestResult {
    let (mut session, _) = cluster_session();
    let zone = session.table().zones()[0].id;

    let outcome = session
        .handle(edit(zone, ZoneField::Addresses, RawValue::Text("10.0.0.1, 10.0.0.2".into())))
        .map_err(|err| err.to_string())?;

    let EventOutcome::Applied {
        sync,
    } = outcome
    else {
        return Err("edit should apply".to_string());
    };
    assert_eq!(
        sync.leaders,
        vec![(
            zone,
            LeaderChange::Reselected {
                previous: None,
                leader: "10.0.0.1".to_string(),
            }
        )]
    );
    let change = ProgrammaticChange {
        zone_id: zone,
        field: ZoneField::Leader,
    };
    assert!(session.programmatic_changes().any(|entry| *entry == change));

    session
        .handle(edit(zone, ZoneField::Leader, RawValue::Text("10.0.0.2".into())))
        .map_err(|err| err.to_string())?;
    assert!(!session.programmatic_changes().any(|entry| *entry == change));
    assert!(!session.has_errors());
    Ok(())
}

#[test]
fn malformed_and_refused_events_leave_state_untouched() {
    let (mut session, sink) = cluster_session();
    let zone = session.table().zones()[0].id;
    let before = session.table().clone();

    let err = session.handle(edit(zone, ZoneField::Name, RawValue::Flag(true))).unwrap_err();
    assert!(matches!(err, TopologyError::FieldValueMismatch { .. }));

    let err = session
        .handle(WizardEvent::RowDelete(RowDeleteEvent {
            zone_id: zone,
        }))
        .unwrap_err();
    assert_eq!(
        err,
        TopologyError::Refused(StructuralRefusal::LastZone {
            min: 1
        })
    );

    let err = session.handle(edit(zone, ZoneField::IsDefault, RawValue::Flag(false))).unwrap_err();
    assert_eq!(err, TopologyError::Refused(StructuralRefusal::DefaultRequired));

    assert_eq!(session.table(), &before);
    let outcomes: Vec<AuditOutcome> = sink.events().iter().map(|event| event.outcome).collect();
    assert_eq!(outcomes, vec![AuditOutcome::Rejected, AuditOutcome::Refused, AuditOutcome::Refused]);
}

#[test]
fn every_event_is_audited_once() {
    let (mut session, sink) = cluster_session();
    let zone = session.table().zones()[0].id;
    session.handle(WizardEvent::RowAdd).unwrap();
    session.handle(edit(zone, ZoneField::Addresses, RawValue::List(vec!["10.0.0.1".into()]))).unwrap();
    session
        .handle(WizardEvent::DeploymentRename {
            name: "prod".into(),
        })
        .unwrap();
    let actions: Vec<AuditAction> = sink.events().iter().map(|event| event.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::ZoneAdd, AuditAction::ZoneEdit, AuditAction::DeploymentRename]
    );
    assert!(sink.events().iter().all(|event| event.event == "wizard_action"));
}

#[test]
fn stale_name_checks_are_discarded() {
    let (mut session, _) = cluster_session();
    let zone = session.table().zones()[0].id;
    let target = NameTarget::Zone {
        zone_id: zone,
    };

    let request = session.request_name_check(target).unwrap();
    session.update_zone(zone, &ZonePatch::addresses(["10.0.0.1"])).unwrap();
    let outcome = session.handle(WizardEvent::NameCheck(request.resolve(false))).unwrap();
    assert_eq!(outcome, EventOutcome::Stale);
    assert!(session.annotations().get(zone, ZoneField::Name).is_empty());
}

#[test]
fn fresh_name_check_failure_sticks_until_the_name_changes() {
    let (mut session, _) = cluster_session();
    let zone = session.table().zones()[0].id;
    let target = NameTarget::Zone {
        zone_id: zone,
    };

    let request = session.request_name_check(target).unwrap();
    assert!(session.apply_name_check(&request.resolve(false)));
    let unavailable = FieldError::NameUnavailable {
        name: "zone1".to_string(),
    };
    assert_eq!(session.annotations().get(zone, ZoneField::Name), &[unavailable.clone()]);

    session.update_zone(zone, &ZonePatch::addresses(["10.0.0.1"])).unwrap();
    assert_eq!(session.annotations().get(zone, ZoneField::Name), &[unavailable]);

    session.update_zone(zone, &ZonePatch::name("zone_b")).unwrap();
    assert!(session.annotations().get(zone, ZoneField::Name).is_empty());
}

#[test]
fn deployment_name_checks_follow_renames() {
    let (mut session, _) = cluster_session();
    session.rename_deployment(" prod-east ");
    assert_eq!(session.deployment_name(), Some("prod-east"));

    let request = session.request_name_check(NameTarget::Deployment).unwrap();
    session.rename_deployment("prod-west");
    assert!(!session.apply_name_check(&request.resolve(false)));
    assert!(session.deployment_errors().is_empty());

    let request = session.request_name_check(NameTarget::Deployment).unwrap();
    assert!(session.apply_name_check(&request.resolve(false)));
    assert_eq!(
        session.deployment_errors(),
        vec![FieldError::NameUnavailable {
            name: "prod-west".to_string()
        }]
    );

    session.rename_deployment("9-bad");
    assert!(matches!(
        session.deployment_errors().as_slice(),
        [FieldError::InvalidName { .. }]
    ));
}

#[test]
fn server_lists_follow_zone_deletion() {
    let (session, _) = cluster_session();
    let mut session = session
        .with_server_list(ComponentId::from("proxy"), ServerCardinality::Multiple)
        .unwrap();
    let proxy = ComponentId::from("proxy");
    let a = session.table().zones()[0].id;
    let b = session.add_zone().unwrap();
    session.update_zone(a, &ZonePatch::addresses(["10.0.0.1"])).unwrap();
    session.update_zone(b, &ZonePatch::addresses(["10.0.0.2"])).unwrap();
    assert_eq!(session.component_servers(&proxy).unwrap().selected(), &["10.0.0.1".to_string()]);

    session
        .handle(WizardEvent::ComponentServers(ComponentServersEvent {
            component_id: proxy.clone(),
            servers: vec!["10.0.0.2".into()],
        }))
        .unwrap();
    let sync = session.delete_zone(b).unwrap();
    assert_eq!(sync.components, vec![proxy.clone()]);
    assert_eq!(session.component_servers(&proxy).unwrap().selected(), &["10.0.0.1".to_string()]);
    assert!(session.snapshot().programmatic_components.contains(&proxy));
}

#[test]
fn server_list_edits_need_a_known_list() {
    let (mut session, _) = cluster_session();
    let err = session.edit_component_servers(&ComponentId::from("agent"), &["10.0.0.1"]).unwrap_err();
    assert_eq!(err, TopologyError::NoServerList(ComponentId::from("agent")));
    let err = session.edit_component_servers(&ComponentId::from("ghost"), &["10.0.0.1"]).unwrap_err();
    assert_eq!(err, TopologyError::UnknownComponent(ComponentId::from("ghost")));
}

#[test]
fn submit_is_blocked_until_every_error_is_fixed() {
    let (session, sink) = cluster_session();
    let mut session = session
        .with_server_list(ComponentId::from("proxy"), ServerCardinality::Single)
        .unwrap();
    let zone = session.table().zones()[0].id;
    session.toggle_component(&ComponentId::from("proxy"), true).unwrap();

    let Err(SubmitError::Blocked {
        error_count,
        components_without_servers,
    }) = session.submit()
    else {
        panic!("submission must be blocked");
    };
    assert_eq!(error_count, 2);
    assert_eq!(components_without_servers, vec![ComponentId::from("proxy")]);
    assert_eq!(
        session.annotations().get(zone, ZoneField::Addresses),
        &[FieldError::AddressesRequired]
    );
    assert_eq!(sink.events().last().map(|event| event.outcome), Some(AuditOutcome::Blocked));

    session.update_zone(zone, &ZonePatch::addresses(["10.0.0.1", "10.0.0.2"])).unwrap();
    session.toggle_component(&ComponentId::from("dashboard"), true).unwrap();
    let payload = session.submit().unwrap();
    assert_eq!(payload.topology.zones.len(), 1);
    assert_eq!(payload.topology.zones[0].leader.as_deref(), Some("10.0.0.1"));
    assert!(payload.topology.zones[0].is_default);
    let components: Vec<&str> =
        payload.components.iter().map(|component| component.id.as_str()).collect();
    assert_eq!(components, vec!["collector", "dashboard", "proxy", "time-series-db"]);
    let proxy = payload.components.iter().find(|component| component.id.as_str() == "proxy");
    assert_eq!(proxy.map(|component| component.servers.clone()), Some(vec!["10.0.0.1".to_string()]));
}

#[test]
fn loading_a_saved_deployment_restores_everything() {
    let (session, _) = cluster_session();
    let mut session = session
        .with_server_list(ComponentId::from("proxy"), ServerCardinality::Multiple)
        .unwrap();
    let saved = DeploymentPayload {
        deployment_name: Some("prod".to_string()),
        topology: TopologyPayload {
            zones: vec![
                ZonePayload {
                    name: "zone1".to_string(),
                    addresses: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
                    leader: Some("10.0.0.2".to_string()),
                    cm_url: None,
                    is_default: false,
                },
                ZonePayload {
                    name: "zone2".to_string(),
                    addresses: vec!["10.0.0.3".to_string()],
                    leader: Some("10.0.0.3".to_string()),
                    cm_url: None,
                    is_default: true,
                },
            ],
        },
        components: vec![ComponentPayload {
            id: ComponentId::from("proxy"),
            servers: vec!["10.0.0.3".to_string(), "10.0.0.1".to_string()],
        }],
    };
    session.load(&saved).unwrap();

    assert_eq!(session.table().len(), 2);
    assert!(session.table().zones()[1].is_default);
    assert_eq!(session.deployment_name(), Some("prod"));
    assert_eq!(
        session.component_servers(&ComponentId::from("proxy")).unwrap().selected(),
        &["10.0.0.3".to_string(), "10.0.0.1".to_string()]
    );
    assert_eq!(session.submit().unwrap(), saved);
}

#[test]
fn loading_unknown_components_is_rejected() {
    let (mut session, _) = cluster_session();
    let before = session.table().clone();
    let saved = DeploymentPayload {
        deployment_name: None,
        topology: TopologyPayload::default(),
        components: vec![ComponentPayload {
            id: ComponentId::from("ghost"),
            servers: Vec::new(),
        }],
    };
    assert!(session.load(&saved).is_err());
    assert_eq!(session.table(), &before);
}

#[test]
fn loading_more_zones_than_the_mode_allows_is_refused() {
    let sink = Arc::new(RecordingAuditSink::default());
    let engine = TopologyEngine::new(DeploymentMode::single_node(), StandardHostSyntax);
    let mut session =
        WizardSession::new(engine, ComponentGraph::standard()).with_audit(sink.clone());
    let before = session.table().clone();
    let zone = |name: &str, address: &str| ZonePayload {
        name: name.to_string(),
        addresses: vec![address.to_string()],
        leader: Some(address.to_string()),
        cm_url: None,
        is_default: false,
    };
    let saved = DeploymentPayload {
        deployment_name: None,
        topology: TopologyPayload {
            zones: vec![zone("zone1", "10.0.0.1"), zone("zone2", "10.0.0.2")],
        },
        components: Vec::new(),
    };

    let err = session.load(&saved).unwrap_err();
    assert_eq!(
        err,
        TopologyError::Refused(StructuralRefusal::MaxZones {
            max: 1
        })
    );
    assert_eq!(session.table(), &before);
    let last = sink.events().last().cloned().unwrap();
    assert_eq!(last.action, AuditAction::Load);
    assert_eq!(last.outcome, AuditOutcome::Refused);
}

#[test]
fn snapshot_reports_structural_affordances() {
    let (mut session, _) = cluster_session();
    let first = session.table().zones()[0].id;
    let snapshot = session.snapshot();
    assert!(snapshot.can_add_zone);
    assert!(snapshot.deletable_zones.is_empty());

    let second = session.add_zone().unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.deletable_zones, vec![first, second]);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["table"]["zones"][1]["name"], "zone2");
    assert!(json["annotations"].as_array().is_some_and(Vec::is_empty));
}
