// crates/topology-core/src/audit.rs
// ============================================================================
// Module: Wizard Audit Logging
// Description: Structured audit events for wizard session actions.
// Purpose: Emit JSON-line logs of every applied, refused or stale action.
// Dependencies: serde, serde_json, crate::core
// ============================================================================

//! ## Overview
//! Every event the session processes produces one [`WizardAuditEvent`]. Sinks
//! decide where events go: stderr, an append-only JSON-lines file, or
//! nowhere. Events carry identifiers and counts, never address values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ComponentId;
use crate::core::ZoneId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Session action being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Row added.
    ZoneAdd,
    /// Row deleted.
    ZoneDelete,
    /// Row field edited.
    ZoneEdit,
    /// Component toggled.
    ComponentToggle,
    /// Component server list edited.
    ComponentServers,
    /// Deployment name edited.
    DeploymentRename,
    /// Backend name check answer applied or discarded.
    NameCheck,
    /// Saved topology loaded.
    Load,
    /// Submission attempted.
    Submit,
}

/// Result of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Action applied.
    Applied,
    /// Action refused to preserve an invariant.
    Refused,
    /// Action rejected as malformed (unknown row, wrong value shape).
    Rejected,
    /// Late answer discarded.
    Stale,
    /// Submission blocked by outstanding errors.
    Blocked,
}

/// Wizard audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct WizardAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Audited action.
    pub action: AuditAction,
    /// Action outcome.
    pub outcome: AuditOutcome,
    /// Zone involved, when any.
    pub zone_id: Option<ZoneId>,
    /// Component involved, when any.
    pub component_id: Option<ComponentId>,
    /// Number of errors shown after the action.
    pub error_count: usize,
    /// Number of programmatic changes the action caused.
    pub programmatic_changes: usize,
    /// Short reason for refusals and rejections.
    pub detail: Option<String>,
}

/// Inputs for constructing a [`WizardAuditEvent`].
#[derive(Debug, Clone)]
pub struct WizardAuditEventParams {
    /// Audited action.
    pub action: AuditAction,
    /// Action outcome.
    pub outcome: AuditOutcome,
    /// Zone involved, when any.
    pub zone_id: Option<ZoneId>,
    /// Component involved, when any.
    pub component_id: Option<ComponentId>,
    /// Number of errors shown after the action.
    pub error_count: usize,
    /// Number of programmatic changes the action caused.
    pub programmatic_changes: usize,
    /// Short reason for refusals and rejections.
    pub detail: Option<String>,
}

impl WizardAuditEventParams {
    /// Params for `action` with the given outcome and no context.
    #[must_use]
    pub const fn new(action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            action,
            outcome,
            zone_id: None,
            component_id: None,
            error_count: 0,
            programmatic_changes: 0,
            detail: None,
        }
    }
}

impl WizardAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: WizardAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "wizard_action",
            timestamp_ms,
            action: params.action,
            outcome: params.outcome,
            zone_id: params.zone_id,
            component_id: params.component_id,
            error_count: params.error_count,
            programmatic_changes: params.programmatic_changes,
            detail: params.detail,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for wizard events.
pub trait WizardAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &WizardAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl WizardAuditSink for StderrAuditSink {
    fn record(&self, event: &WizardAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl WizardAuditSink for FileAuditSink {
    fn record(&self, event: &WizardAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl WizardAuditSink for NoopAuditSink {
    fn record(&self, _event: &WizardAuditEvent) {}
}
