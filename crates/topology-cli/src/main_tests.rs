// crates/topology-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for bounded reads, selection resolution and replay.
// Purpose: Ensure CLI helpers fail closed and report per-event results.
// Dependencies: topology-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises the helpers behind the `topology-wizard` subcommands without
//! spawning the binary.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use clap::Parser;
use topology_config::WizardConfig;
use topology_core::ComponentGraph;
use topology_core::ComponentId;
use topology_core::RowDeleteEvent;
use topology_core::WizardEvent;

use super::Cli;
use super::Commands;
use super::ReadLimitError;
use super::canonical_json_bytes;
use super::check_report;
use super::read_bytes_with_limit;
use super::replay;
use super::resolve_selection;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn read_bytes_with_limit_rejects_oversized_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("payload.json");
    fs::write(&path, vec![b'a'; 64]).expect("write");

    assert_eq!(read_bytes_with_limit(&path, 64).expect("read").len(), 64);
    assert!(matches!(
        read_bytes_with_limit(&path, 63),
        Err(ReadLimitError::TooLarge {
            size: 64,
            limit: 63
        })
    ));
    assert!(matches!(
        read_bytes_with_limit(&dir.path().join("missing.json"), 64),
        Err(ReadLimitError::Io(_))
    ));
}

#[test]
fn resolve_selection_selects_then_deselects() {
    let graph = ComponentGraph::standard();
    let selection = resolve_selection(
        &graph,
        &["dashboard".to_string(), "proxy".to_string()],
        &["collector".to_string()],
    )
    .expect("resolve");
    let ids: Vec<&str> = selection.iter().map(ComponentId::as_str).collect();
    assert_eq!(ids, vec!["proxy", "time-series-db"]);

    let err = resolve_selection(&graph, &["mystery".to_string()], &[]).unwrap_err();
    assert!(err.to_string().contains("mystery"));
}

#[test]
fn replay_reports_rejected_events_and_continues() {
    let mut session = WizardConfig::default().build_session().expect("session");
    let first = session.table().zones()[0].id;
    let events = vec![
        WizardEvent::RowAdd,
        WizardEvent::RowDelete(RowDeleteEvent {
            zone_id: first,
        }),
        WizardEvent::RowDelete(RowDeleteEvent {
            zone_id: first,
        }),
    ];
    let report = replay(&mut session, events);
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps[0].outcome.is_some());
    assert!(report.steps[1].outcome.is_some());
    assert!(report.steps[2].error.is_some());
    assert_eq!(report.snapshot.table.len(), 1);
}

#[test]
fn check_report_of_a_fresh_session_lists_required_fields() {
    let mut session = WizardConfig::default().build_session().expect("session");
    let report = check_report(&mut session);
    assert!(!report.valid);
    assert_eq!(report.error_count, 2);
    let json = String::from_utf8(canonical_json_bytes(&report).expect("json")).expect("utf8");
    assert!(json.starts_with("{\"annotations\":"), "canonical key order: {json}");
}

#[test]
fn cli_parses_repeated_selection_flags() {
    let cli = Cli::try_parse_from([
        "topology-wizard",
        "components",
        "resolve",
        "--select",
        "dashboard",
        "--select",
        "proxy",
        "--deselect",
        "collector",
    ])
    .expect("parse");
    let Commands::Components {
        command: super::ComponentsCommand::Resolve(command),
    } = cli.command
    else {
        panic!("unexpected command");
    };
    assert_eq!(command.select, vec!["dashboard".to_string(), "proxy".to_string()]);
    assert_eq!(command.deselect, vec!["collector".to_string()]);
    assert!(command.config.config.is_none());
}
