// crates/topology-core/tests/common/mod.rs
// =============================================================================
// Module: Topology Test Helpers
// Description: Shared fixtures for topology engine and session tests.
// Purpose: Build tables and sessions without repeating event plumbing.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use topology_core::AddressHistory;
use topology_core::ComponentGraph;
use topology_core::DeploymentMode;
use topology_core::ErrorAnnotations;
use topology_core::FieldError;
use topology_core::StandardHostSyntax;
use topology_core::TopologyEngine;
use topology_core::TopologyTable;
use topology_core::WizardAuditEvent;
use topology_core::WizardAuditSink;
use topology_core::WizardSession;
use topology_core::ZoneField;
use topology_core::ZoneId;
use topology_core::ZonePatch;

/// Engine for the cluster wizard.
pub fn cluster_engine() -> TopologyEngine {
    TopologyEngine::new(DeploymentMode::cluster(), StandardHostSyntax)
}

/// Engine for the OMS wizard.
pub fn oms_engine() -> TopologyEngine {
    TopologyEngine::new(DeploymentMode::oms(), StandardHostSyntax)
}

/// Table state threaded through pure engine calls.
pub struct TableState {
    /// Current table.
    pub table: TopologyTable,
    /// Current annotations.
    pub annotations: ErrorAnnotations,
    /// Current address history.
    pub history: AddressHistory,
}

impl TableState {
    /// Starts from the engine's initial table.
    pub fn initial(engine: &TopologyEngine) -> Self {
        Self {
            table: engine.initial_table(),
            annotations: ErrorAnnotations::new(),
            history: AddressHistory::new(),
        }
    }

    /// Applies a patch, panicking on refusal.
    pub fn apply(&mut self, engine: &TopologyEngine, id: ZoneId, patch: &ZonePatch) {
        let outcome = engine
            .update_zone(&self.table, id, patch, &self.annotations, &self.history)
            .expect("update applies");
        self.table = outcome.table;
        self.annotations = outcome.annotations;
        self.history = outcome.history;
    }

    /// Replaces a zone's addresses.
    pub fn set_addresses(&mut self, engine: &TopologyEngine, id: ZoneId, addresses: &[&str]) {
        self.apply(engine, id, &ZonePatch::addresses(addresses.iter().copied()));
    }

    /// Appends a zone and returns its id.
    pub fn add(&mut self, engine: &TopologyEngine) -> ZoneId {
        let (table, id) = engine.add_zone(&self.table).expect("add allowed");
        self.table = table;
        id
    }

    /// Deletes a zone and revalidates.
    pub fn delete(&mut self, engine: &TopologyEngine, id: ZoneId) {
        self.table = engine.delete_zone(&self.table, id).expect("delete allowed");
        self.history.forget_zone(id);
        self.annotations =
            engine.validator().revalidate(&self.table, id, &self.annotations, &self.history);
    }

    /// Errors on one field.
    pub fn errors(&self, id: ZoneId, field: ZoneField) -> Vec<FieldError> {
        self.annotations.get(id, field).to_vec()
    }
}

/// Builds a table whose zones hold the given address lists.
pub fn table_with(engine: &TopologyEngine, zones: &[&[&str]]) -> (TableState, Vec<ZoneId>) {
    let mut state = TableState::initial(engine);
    let mut ids = vec![state.table.zones()[0].id];
    for _ in 1 .. zones.len() {
        ids.push(state.add(engine));
    }
    for (id, addresses) in ids.iter().zip(zones) {
        state.set_addresses(engine, *id, addresses);
    }
    (state, ids)
}

/// Returns true when the field carries a cross-zone duplicate for `address`
/// attributed to `other`.
pub fn has_duplicate(errors: &[FieldError], address: &str, other: ZoneId) -> bool {
    errors.iter().any(|error| {
        matches!(
            error,
            FieldError::DuplicateAcrossZones { address: dup, zone } if dup.as_str() == address && *zone == other
        )
    })
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Recorded events.
    pub events: Mutex<Vec<WizardAuditEvent>>,
}

impl RecordingAuditSink {
    /// Returns a snapshot of the recorded events.
    pub fn events(&self) -> Vec<WizardAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl WizardAuditSink for RecordingAuditSink {
    fn record(&self, event: &WizardAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Session for the cluster wizard with the standard graph and a recorder.
pub fn cluster_session() -> (WizardSession, Arc<RecordingAuditSink>) {
    let sink = Arc::new(RecordingAuditSink::default());
    let session =
        WizardSession::new(cluster_engine(), ComponentGraph::standard()).with_audit(sink.clone());
    (session, sink)
}
