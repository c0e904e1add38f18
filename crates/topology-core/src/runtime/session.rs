// crates/topology-core/src/runtime/session.rs
// ============================================================================
// Module: Wizard Session
// Description: Stateful driver of one topology and component wizard run.
// Purpose: Consume discrete events and keep table, annotations and derived
//          fields consistent between them.
// Dependencies: serde, thiserror, crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The session owns the only mutable state of a wizard run: the topology
//! table, its annotations, the address history, the component selection and
//! server lists, the deployment name, and the outstanding external name
//! errors. Every inbound event is handled to completion before the next one,
//! and every event produces exactly one audit record.
//!
//! Backend name checks are asynchronous. [`WizardSession::request_name_check`]
//! captures the target's edit counter; a late answer whose counter or name no
//! longer matches is discarded as stale.
//!
//! # Invariants
//! - Table-wide annotations always reflect the current table.
//! - The component selection stays closed under the dependency graph.
//! - Submission validates strictly and never emits a payload with errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::audit::AuditAction;
use crate::audit::AuditOutcome;
use crate::audit::NoopAuditSink;
use crate::audit::WizardAuditEvent;
use crate::audit::WizardAuditEventParams;
use crate::audit::WizardAuditSink;
use crate::core::AddressHistory;
use crate::core::ComponentGraph;
use crate::core::ComponentId;
use crate::core::ComponentPayload;
use crate::core::ComponentSelection;
use crate::core::DeploymentPayload;
use crate::core::ErrorAnnotations;
use crate::core::FieldError;
use crate::core::NameCheckRequest;
use crate::core::NameCheckResult;
use crate::core::NameGrammar;
use crate::core::NameTarget;
use crate::core::RowEditEvent;
use crate::core::TopologyError;
use crate::core::TopologyPayload;
use crate::core::TopologyTable;
use crate::core::WizardEvent;
use crate::core::ZoneField;
use crate::core::ZoneId;
use crate::core::ZonePatch;
use crate::interfaces::HostSyntax;
use crate::interfaces::StandardHostSyntax;
use crate::runtime::engine::TopologyEngine;
use crate::runtime::resolver;
use crate::runtime::synchronizer::ComponentServers;
use crate::runtime::synchronizer::ServerCardinality;
use crate::runtime::synchronizer::SyncReport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Grammar applied to the deployment name.
const DEPLOYMENT_NAME_GRAMMAR: NameGrammar = NameGrammar {
    allow_hyphen: true,
};

// ============================================================================
// SECTION: Types
// ============================================================================

/// A field the session changed without a user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ProgrammaticChange {
    /// Changed zone.
    pub zone_id: ZoneId,
    /// Changed field.
    pub field: ZoneField,
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Event applied.
    Applied {
        /// Programmatic changes caused by the event.
        sync: SyncReport,
    },
    /// Late name-check answer discarded.
    Stale,
}

/// Serializable view of the session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Current table.
    pub table: TopologyTable,
    /// Zone annotations, including external name errors.
    pub annotations: ErrorAnnotations,
    /// Total number of zone field errors.
    pub error_count: usize,
    /// Deployment name, when set.
    pub deployment_name: Option<String>,
    /// Errors on the deployment name.
    pub deployment_errors: Vec<FieldError>,
    /// Selected components.
    pub selection: ComponentSelection,
    /// Component server lists.
    pub component_servers: Vec<ComponentServers>,
    /// Zone fields changed programmatically since their last user edit.
    pub programmatic_changes: Vec<ProgrammaticChange>,
    /// Components whose server list changed programmatically.
    pub programmatic_components: Vec<ComponentId>,
    /// Whether another zone may be added.
    pub can_add_zone: bool,
    /// Zones that may currently be deleted.
    pub deletable_zones: Vec<ZoneId>,
}

/// Submission errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Outstanding errors block submission.
    #[error(
        "submission blocked: {error_count} field error(s), {} component(s) without servers",
        .components_without_servers.len()
    )]
    Blocked {
        /// Field errors after strict validation, deployment name included.
        error_count: usize,
        /// Selected components whose server list is empty.
        components_without_servers: Vec<ComponentId>,
    },
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Stateful wizard session.
pub struct WizardSession<H = StandardHostSyntax> {
    /// Pure table engine.
    engine: TopologyEngine<H>,
    /// Component dependency graph.
    graph: ComponentGraph,
    /// Current table.
    table: TopologyTable,
    /// Addresses released by row edits.
    history: AddressHistory,
    /// Engine-computed annotations.
    annotations: ErrorAnnotations,
    /// Backend name-check failures by target.
    external: BTreeMap<NameTarget, FieldError>,
    /// Selected components.
    selection: ComponentSelection,
    /// Server lists of components that have one.
    servers: BTreeMap<ComponentId, ComponentServers>,
    /// Deployment name, when set.
    deployment_name: Option<String>,
    /// Edit counter of the deployment name.
    deployment_revision: u64,
    /// Zone fields changed programmatically.
    programmatic: BTreeSet<ProgrammaticChange>,
    /// Component lists changed programmatically.
    programmatic_components: BTreeSet<ComponentId>,
    /// Audit sink.
    audit: Arc<dyn WizardAuditSink>,
}

impl<H: HostSyntax> WizardSession<H> {
    /// Starts a session with the initial one-row table and nothing selected.
    #[must_use]
    pub fn new(engine: TopologyEngine<H>, graph: ComponentGraph) -> Self {
        let table = engine.initial_table();
        let history = AddressHistory::new();
        let annotations = engine.validate(&table, &history, false);
        Self {
            engine,
            graph,
            table,
            history,
            annotations,
            external: BTreeMap::new(),
            selection: ComponentSelection::new(),
            servers: BTreeMap::new(),
            deployment_name: None,
            deployment_revision: 0,
            programmatic: BTreeSet::new(),
            programmatic_components: BTreeSet::new(),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Routes audit events to `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn WizardAuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Gives `component` a server list.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownComponent`] when the graph lacks it.
    pub fn with_server_list(
        mut self,
        component: ComponentId,
        cardinality: ServerCardinality,
    ) -> Result<Self, TopologyError> {
        if !self.graph.contains(&component) {
            return Err(TopologyError::UnknownComponent(component));
        }
        let mut list = ComponentServers::new(component.clone(), cardinality);
        list.sync(&self.table.all_addresses());
        self.servers.insert(component, list);
        Ok(self)
    }

    /// Starts from a selection closed under the graph.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownComponent`] for unknown identifiers.
    pub fn with_selection<'a>(
        mut self,
        ids: impl IntoIterator<Item = &'a ComponentId>,
    ) -> Result<Self, TopologyError> {
        self.selection = resolver::select_all(&self.graph, ids)?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &TopologyEngine<H> {
        &self.engine
    }

    /// Returns the component graph.
    #[must_use]
    pub const fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    /// Returns the current table.
    #[must_use]
    pub const fn table(&self) -> &TopologyTable {
        &self.table
    }

    /// Returns the address history.
    #[must_use]
    pub const fn history(&self) -> &AddressHistory {
        &self.history
    }

    /// Returns the current selection.
    #[must_use]
    pub const fn selection(&self) -> &ComponentSelection {
        &self.selection
    }

    /// Returns the server list of a component.
    #[must_use]
    pub fn component_servers(&self, id: &ComponentId) -> Option<&ComponentServers> {
        self.servers.get(id)
    }

    /// Returns the deployment name.
    #[must_use]
    pub fn deployment_name(&self) -> Option<&str> {
        self.deployment_name.as_deref()
    }

    /// Returns zone fields changed programmatically since their last edit.
    pub fn programmatic_changes(&self) -> impl Iterator<Item = &ProgrammaticChange> {
        self.programmatic.iter()
    }

    /// Zone annotations merged with external name errors.
    #[must_use]
    pub fn annotations(&self) -> ErrorAnnotations {
        let mut merged = self.annotations.clone();
        for (target, error) in &self.external {
            if let NameTarget::Zone {
                zone_id,
            } = target
            {
                merged.push(*zone_id, ZoneField::Name, error.clone());
            }
        }
        merged
    }

    /// Errors on the deployment name.
    #[must_use]
    pub fn deployment_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.deployment_name
            && let Err(reason) = DEPLOYMENT_NAME_GRAMMAR.check(name)
        {
            errors.push(FieldError::InvalidName {
                reason: reason.to_string(),
            });
        }
        if let Some(error) = self.external.get(&NameTarget::Deployment) {
            errors.push(error.clone());
        }
        errors
    }

    /// Returns true when any zone or deployment field carries an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.annotations().is_empty() || !self.deployment_errors().is_empty()
    }

    /// Captures the session state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let annotations = self.annotations();
        let mode = self.engine.mode();
        SessionSnapshot {
            error_count: annotations.error_count(),
            annotations,
            table: self.table.clone(),
            deployment_name: self.deployment_name.clone(),
            deployment_errors: self.deployment_errors(),
            selection: self.selection.clone(),
            component_servers: self.servers.values().cloned().collect(),
            programmatic_changes: self.programmatic.iter().copied().collect(),
            programmatic_components: self.programmatic_components.iter().cloned().collect(),
            can_add_zone: self.table.can_add(mode),
            deletable_zones: self
                .table
                .zones()
                .iter()
                .map(|zone| zone.id)
                .filter(|id| self.table.can_delete(mode, *id))
                .collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Handles one inbound event.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] for refused or malformed events; the session
    /// state is unchanged in that case.
    pub fn handle(&mut self, event: WizardEvent) -> Result<EventOutcome, TopologyError> {
        let sync = match event {
            WizardEvent::RowEdit(edit) => self.edit_zone(&edit)?,
            WizardEvent::RowAdd => {
                self.add_zone()?;
                SyncReport::default()
            }
            WizardEvent::RowDelete(delete) => self.delete_zone(delete.zone_id)?,
            WizardEvent::ComponentToggle(toggle) => {
                self.toggle_component(&toggle.component_id, toggle.selected)?;
                SyncReport::default()
            }
            WizardEvent::ComponentServers(edit) => {
                self.edit_component_servers(&edit.component_id, &edit.servers)?;
                SyncReport::default()
            }
            WizardEvent::DeploymentRename {
                name,
            } => {
                self.rename_deployment(&name);
                SyncReport::default()
            }
            WizardEvent::NameCheck(result) => {
                return Ok(if self.apply_name_check(&result) {
                    EventOutcome::Applied {
                        sync: SyncReport::default(),
                    }
                } else {
                    EventOutcome::Stale
                });
            }
        };
        Ok(EventOutcome::Applied {
            sync,
        })
    }

    /// Appends a new row.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Refused`] when the row cap is reached.
    pub fn add_zone(&mut self) -> Result<ZoneId, TopologyError> {
        let (table, id) = match self.engine.add_zone(&self.table) {
            Ok(next) => next,
            Err(refusal) => {
                let err = TopologyError::from(refusal);
                self.audit_error(AuditAction::ZoneAdd, None, &err);
                return Err(err);
            }
        };
        self.table = table;
        self.annotations =
            self.engine.validator().revalidate(&self.table, id, &self.annotations, &self.history);
        self.record(AuditAction::ZoneAdd, AuditOutcome::Applied, Some(id), 0);
        Ok(id)
    }

    /// Deletes a row and reconciles everything that referenced it.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] for unknown rows or when the minimum row count
    /// would be violated.
    pub fn delete_zone(&mut self, id: ZoneId) -> Result<SyncReport, TopologyError> {
        let table = match self.engine.delete_zone(&self.table, id) {
            Ok(table) => table,
            Err(err) => {
                self.audit_error(AuditAction::ZoneDelete, Some(id), &err);
                return Err(err);
            }
        };
        let default_before = self.table.default_zone().map(|zone| zone.id);
        self.table = table;
        self.history.forget_zone(id);
        self.external.remove(&NameTarget::Zone {
            zone_id: id,
        });
        self.programmatic.retain(|change| change.zone_id != id);
        if let Some(promoted) = self.table.default_zone().map(|zone| zone.id)
            && default_before != Some(promoted)
        {
            self.programmatic.insert(ProgrammaticChange {
                zone_id: promoted,
                field: ZoneField::IsDefault,
            });
        }
        self.annotations =
            self.engine.validator().revalidate(&self.table, id, &self.annotations, &self.history);
        let sync = self.sync_servers();
        self.record(
            AuditAction::ZoneDelete,
            AuditOutcome::Applied,
            Some(id),
            sync.components.len(),
        );
        Ok(sync)
    }

    /// Applies a single-field row edit reported by the form.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when the value shape does not fit the field,
    /// the row is unknown, or the edit would clear the only default.
    pub fn edit_zone(&mut self, edit: &RowEditEvent) -> Result<SyncReport, TopologyError> {
        match edit.to_patch() {
            Ok(patch) => self.update_zone(edit.zone_id, &patch),
            Err(err) => {
                self.audit_error(AuditAction::ZoneEdit, Some(edit.zone_id), &err);
                Err(err)
            }
        }
    }

    /// Applies a patch to one row.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when the row is unknown or the patch would
    /// clear the only default.
    pub fn update_zone(
        &mut self,
        id: ZoneId,
        patch: &ZonePatch,
    ) -> Result<SyncReport, TopologyError> {
        let outcome = match self.engine.update_zone(
            &self.table,
            id,
            patch,
            &self.annotations,
            &self.history,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.audit_error(AuditAction::ZoneEdit, Some(id), &err);
                return Err(err);
            }
        };
        let addresses_changed = self.table.get(id).map(|zone| &zone.addresses)
            != outcome.table.get(id).map(|zone| &zone.addresses);
        let defaults_before: BTreeSet<ZoneId> =
            self.table.zones().iter().filter(|zone| zone.is_default).map(|zone| zone.id).collect();

        self.table = outcome.table;
        self.annotations = outcome.annotations;
        self.history = outcome.history;
        let mut sync = outcome.sync;

        for field in patch.fields() {
            self.programmatic.remove(&ProgrammaticChange {
                zone_id: id,
                field,
            });
        }
        if patch.name.is_some() {
            self.external.remove(&NameTarget::Zone {
                zone_id: id,
            });
        }
        for (zone_id, _) in &sync.leaders {
            self.programmatic.insert(ProgrammaticChange {
                zone_id: *zone_id,
                field: ZoneField::Leader,
            });
        }
        for zone in self.table.zones() {
            if zone.id != id && defaults_before.contains(&zone.id) && !zone.is_default {
                self.programmatic.insert(ProgrammaticChange {
                    zone_id: zone.id,
                    field: ZoneField::IsDefault,
                });
            }
        }
        if addresses_changed {
            sync.components = self.sync_servers().components;
        }

        let changes = sync.leaders.len() + sync.components.len();
        self.record(AuditAction::ZoneEdit, AuditOutcome::Applied, Some(id), changes);
        Ok(sync)
    }

    /// Toggles a component with dependency cascade.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownComponent`] when the graph lacks `id`.
    pub fn toggle_component(
        &mut self,
        id: &ComponentId,
        selected: bool,
    ) -> Result<&ComponentSelection, TopologyError> {
        match resolver::toggle(&self.graph, &self.selection, id, selected) {
            Ok(next) => {
                let cascaded = resolver::changed_components(&self.selection, &next)
                    .into_iter()
                    .filter(|changed| changed != id)
                    .count();
                self.selection = next;
                let mut params = WizardAuditEventParams::new(
                    AuditAction::ComponentToggle,
                    AuditOutcome::Applied,
                );
                params.component_id = Some(id.clone());
                params.programmatic_changes = cascaded;
                self.audit.record(&WizardAuditEvent::new(params));
                Ok(&self.selection)
            }
            Err(err) => {
                self.audit_component_error(AuditAction::ComponentToggle, id, &err);
                Err(err)
            }
        }
    }

    /// Replaces a component's server list with a user edit.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownComponent`] for components outside the
    /// graph and [`TopologyError::NoServerList`] for components without a list.
    pub fn edit_component_servers<S: AsRef<str>>(
        &mut self,
        id: &ComponentId,
        servers: &[S],
    ) -> Result<&ComponentServers, TopologyError> {
        let available = self.table.all_addresses();
        let err = if self.graph.contains(id) {
            TopologyError::NoServerList(id.clone())
        } else {
            TopologyError::UnknownComponent(id.clone())
        };
        if !self.servers.contains_key(id) {
            self.audit_component_error(AuditAction::ComponentServers, id, &err);
            return Err(err);
        }
        self.programmatic_components.remove(id);
        let mut params =
            WizardAuditEventParams::new(AuditAction::ComponentServers, AuditOutcome::Applied);
        params.component_id = Some(id.clone());
        self.audit.record(&WizardAuditEvent::new(params));
        let Some(list) = self.servers.get_mut(id) else {
            return Err(err);
        };
        list.edit(servers, &available);
        Ok(list)
    }

    /// Sets the deployment name.
    pub fn rename_deployment(&mut self, name: &str) {
        let trimmed = name.trim();
        self.deployment_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.deployment_revision += 1;
        self.external.remove(&NameTarget::Deployment);
        let mut params =
            WizardAuditEventParams::new(AuditAction::DeploymentRename, AuditOutcome::Applied);
        params.error_count = self.deployment_errors().len();
        self.audit.record(&WizardAuditEvent::new(params));
    }

    /// Replaces the state with a saved deployment.
    ///
    /// Loaded rows are pristine, so required-field errors stay hidden until
    /// the user edits them or submits.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when a saved component is unknown or has no
    /// server list, or when the saved topology holds more zones than the mode
    /// allows; the session is unchanged in that case.
    pub fn load(&mut self, payload: &DeploymentPayload) -> Result<(), TopologyError> {
        let ids: Vec<ComponentId> =
            payload.components.iter().map(|entry| entry.id.clone()).collect();
        let selection = match resolver::select_all(&self.graph, &ids) {
            Ok(selection) => selection,
            Err(err) => {
                self.audit_error(AuditAction::Load, None, &err);
                return Err(err);
            }
        };
        let table = match self.engine.load(&payload.topology) {
            Ok(table) => table,
            Err(refusal) => {
                let err = TopologyError::from(refusal);
                self.audit_error(AuditAction::Load, None, &err);
                return Err(err);
            }
        };
        if let Some(entry) = payload
            .components
            .iter()
            .find(|entry| !entry.servers.is_empty() && !self.servers.contains_key(&entry.id))
        {
            let err = TopologyError::NoServerList(entry.id.clone());
            self.audit_error(AuditAction::Load, None, &err);
            return Err(err);
        }

        self.table = table;
        self.history = AddressHistory::new();
        self.annotations = self.engine.validate(&self.table, &self.history, false);
        self.external.clear();
        self.programmatic.clear();
        self.programmatic_components.clear();
        self.selection = selection;
        self.deployment_name = payload
            .deployment_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self.deployment_revision += 1;

        let available = self.table.all_addresses();
        for list in self.servers.values_mut() {
            let saved = payload.components.iter().find(|entry| &entry.id == list.component());
            match saved {
                Some(entry) if !entry.servers.is_empty() => list.edit(&entry.servers, &available),
                _ => list.edit::<String>(&[], &available),
            }
            list.sync(&available);
        }

        let mut params = WizardAuditEventParams::new(AuditAction::Load, AuditOutcome::Applied);
        params.error_count = self.annotations.error_count();
        self.audit.record(&WizardAuditEvent::new(params));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // External name checks
    // ------------------------------------------------------------------------

    /// Captures a backend name check for `target` at its current revision.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownZone`] for a missing row.
    pub fn request_name_check(
        &self,
        target: NameTarget,
    ) -> Result<NameCheckRequest, TopologyError> {
        match target {
            NameTarget::Zone {
                zone_id,
            } => {
                let zone = self.table.get(zone_id).ok_or(TopologyError::UnknownZone(zone_id))?;
                Ok(NameCheckRequest {
                    target,
                    name: zone.name.clone(),
                    revision: zone.revision,
                })
            }
            NameTarget::Deployment => Ok(NameCheckRequest {
                target,
                name: self.deployment_name.clone().unwrap_or_default(),
                revision: self.deployment_revision,
            }),
        }
    }

    /// Applies a backend answer. Returns false when it was stale.
    pub fn apply_name_check(&mut self, result: &NameCheckResult) -> bool {
        let current = match result.target {
            NameTarget::Zone {
                zone_id,
            } => self.table.get(zone_id).map(|zone| (zone.revision, zone.name.clone())),
            NameTarget::Deployment => Some((
                self.deployment_revision,
                self.deployment_name.clone().unwrap_or_default(),
            )),
        };
        let fresh = current
            .is_some_and(|(revision, name)| revision == result.revision && name == result.name);
        let zone_id = match result.target {
            NameTarget::Zone {
                zone_id,
            } => Some(zone_id),
            NameTarget::Deployment => None,
        };
        if !fresh {
            self.record(AuditAction::NameCheck, AuditOutcome::Stale, zone_id, 0);
            return false;
        }
        if result.available {
            self.external.remove(&result.target);
        } else {
            self.external.insert(
                result.target,
                FieldError::NameUnavailable {
                    name: result.name.clone(),
                },
            );
        }
        self.record(AuditAction::NameCheck, AuditOutcome::Applied, zone_id, 0);
        true
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    /// Validates strictly and builds the backend payload.
    ///
    /// Strict validation also flags empty required fields of rows the user
    /// never touched; those annotations stay visible after a blocked attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Blocked`] while any error remains.
    pub fn submit(&mut self) -> Result<DeploymentPayload, SubmitError> {
        self.annotations = self.engine.validate(&self.table, &self.history, true);
        let error_count = self.annotations().error_count() + self.deployment_errors().len();
        let components_without_servers: Vec<ComponentId> = self
            .selection
            .iter()
            .filter(|id| self.servers.get(*id).is_some_and(|list| list.selected().is_empty()))
            .cloned()
            .collect();
        if error_count > 0 || !components_without_servers.is_empty() {
            let mut params =
                WizardAuditEventParams::new(AuditAction::Submit, AuditOutcome::Blocked);
            params.error_count = error_count;
            self.audit.record(&WizardAuditEvent::new(params));
            return Err(SubmitError::Blocked {
                error_count,
                components_without_servers,
            });
        }
        let components = self
            .selection
            .iter()
            .map(|id| ComponentPayload {
                id: id.clone(),
                servers: self
                    .servers
                    .get(id)
                    .map(|list| list.selected().to_vec())
                    .unwrap_or_default(),
            })
            .collect();
        self.record(AuditAction::Submit, AuditOutcome::Applied, None, 0);
        Ok(DeploymentPayload {
            deployment_name: self.deployment_name.clone(),
            topology: TopologyPayload::from_table(&self.table, self.engine.mode()),
            components,
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Reconciles every server list with the table and tracks changes.
    fn sync_servers(&mut self) -> SyncReport {
        let report = self.engine.sync_component_servers(&self.table, self.servers.values_mut());
        self.programmatic_components.extend(report.components.iter().cloned());
        report
    }

    /// Records an audit event for a zone-scoped action.
    fn record(
        &self,
        action: AuditAction,
        outcome: AuditOutcome,
        zone_id: Option<ZoneId>,
        programmatic_changes: usize,
    ) {
        let mut params = WizardAuditEventParams::new(action, outcome);
        params.zone_id = zone_id;
        params.error_count = self.annotations.error_count() + self.external.len();
        params.programmatic_changes = programmatic_changes;
        self.audit.record(&WizardAuditEvent::new(params));
    }

    /// Records a failed zone-scoped action.
    fn audit_error(&self, action: AuditAction, zone_id: Option<ZoneId>, err: &TopologyError) {
        let mut params = WizardAuditEventParams::new(action, error_outcome(err));
        params.zone_id = zone_id;
        params.detail = Some(err.to_string());
        self.audit.record(&WizardAuditEvent::new(params));
    }

    /// Records a failed component action.
    fn audit_component_error(&self, action: AuditAction, id: &ComponentId, err: &TopologyError) {
        let mut params = WizardAuditEventParams::new(action, error_outcome(err));
        params.component_id = Some(id.clone());
        params.detail = Some(err.to_string());
        self.audit.record(&WizardAuditEvent::new(params));
    }
}

/// Maps an engine error to its audit outcome.
const fn error_outcome(err: &TopologyError) -> AuditOutcome {
    match err {
        TopologyError::Refused(_) => AuditOutcome::Refused,
        TopologyError::UnknownZone(_)
        | TopologyError::UnknownComponent(_)
        | TopologyError::NoServerList(_)
        | TopologyError::FieldValueMismatch {
            ..
        } => AuditOutcome::Rejected,
    }
}
