// crates/topology-core/src/runtime/engine.rs
// ============================================================================
// Module: Topology Engine
// Description: Pure table operations for one deployment mode.
// Purpose: Apply lifecycle and edit operations and return the next state.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The engine never mutates caller state: every operation takes the current
//! table (and, for edits, the current annotations and address history) and
//! returns the next values. An edit runs in a fixed order: apply the patch,
//! enforce default exclusivity, synchronize the leader when the addresses
//! changed, then revalidate.
//!
//! # Invariants
//! - Refused operations return an error and leave the input untouched.
//! - Row revisions only increase.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AddressError;
use crate::core::AddressHistory;
use crate::core::AddressInput;
use crate::core::AddressSet;
use crate::core::DeploymentMode;
use crate::core::ErrorAnnotations;
use crate::core::StructuralRefusal;
use crate::core::TopologyError;
use crate::core::TopologyPayload;
use crate::core::TopologyTable;
use crate::core::Zone;
use crate::core::ZoneId;
use crate::core::ZonePatch;
use crate::interfaces::HostSyntax;
use crate::interfaces::StandardHostSyntax;
use crate::runtime::synchronizer::ComponentServers;
use crate::runtime::synchronizer::SyncReport;
use crate::runtime::synchronizer::sync_leader;
use crate::runtime::validator::CrossRowValidator;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Next state after a row edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Updated table.
    pub table: TopologyTable,
    /// Revalidated annotations.
    pub annotations: ErrorAnnotations,
    /// Updated address history.
    pub history: AddressHistory,
    /// Programmatic changes made by the synchronizer.
    pub sync: SyncReport,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Topology engine for one deployment mode.
#[derive(Debug, Clone, Default)]
pub struct TopologyEngine<H = StandardHostSyntax> {
    /// Mode whose rules apply.
    mode: DeploymentMode,
    /// Host-syntax predicate.
    syntax: H,
}

impl<H: HostSyntax> TopologyEngine<H> {
    /// Creates an engine.
    #[must_use]
    pub const fn new(mode: DeploymentMode, syntax: H) -> Self {
        Self {
            mode,
            syntax,
        }
    }

    /// Returns the deployment mode.
    #[must_use]
    pub const fn mode(&self) -> &DeploymentMode {
        &self.mode
    }

    /// Returns the host syntax predicate.
    #[must_use]
    pub const fn syntax(&self) -> &H {
        &self.syntax
    }

    /// Returns a validator bound to this engine's mode and syntax.
    #[must_use]
    pub const fn validator(&self) -> CrossRowValidator<'_, H> {
        CrossRowValidator::new(&self.mode, &self.syntax)
    }

    /// Creates the initial one-row table.
    #[must_use]
    pub fn initial_table(&self) -> TopologyTable {
        TopologyTable::initial(&self.mode)
    }

    /// Appends a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralRefusal::MaxZones`] when the row cap is reached.
    pub fn add_zone(
        &self,
        table: &TopologyTable,
    ) -> Result<(TopologyTable, ZoneId), StructuralRefusal> {
        table.add_zone(&self.mode)
    }

    /// Deletes a row, promoting a new default when needed.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] for unknown rows or when the minimum row count
    /// would be violated.
    pub fn delete_zone(
        &self,
        table: &TopologyTable,
        id: ZoneId,
    ) -> Result<TopologyTable, TopologyError> {
        table.delete_zone(&self.mode, id)
    }

    /// Applies a patch to one row and revalidates the table.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownZone`] for a missing row and
    /// [`StructuralRefusal::DefaultRequired`] when the patch would clear the
    /// only default.
    pub fn update_zone(
        &self,
        table: &TopologyTable,
        id: ZoneId,
        patch: &ZonePatch,
        previous: &ErrorAnnotations,
        history: &AddressHistory,
    ) -> Result<UpdateOutcome, TopologyError> {
        if table.get(id).is_none() {
            return Err(TopologyError::UnknownZone(id));
        }
        if patch.is_default == Some(false) && !table.can_clear_default(&self.mode, id) {
            return Err(StructuralRefusal::DefaultRequired.into());
        }

        let mut next = table.clone();
        let mut history = history.clone();
        let mut sync = SyncReport::default();

        if patch.is_default == Some(true) && self.mode.enforces_default() {
            for zone in next.zones_mut() {
                zone.is_default = zone.id == id;
            }
        }
        let zone = next.get_mut(id).ok_or(TopologyError::UnknownZone(id))?;
        zone.revision += 1;
        if let Some(name) = &patch.name {
            zone.name.clone_from(name);
        }
        if let Some(leader) = &patch.leader {
            zone.leader.clone_from(leader);
        }
        if let Some(flag) = patch.is_default {
            zone.is_default = flag;
        }
        if let Some(raw) = &patch.addresses {
            let before = zone.addresses.clone();
            self.apply_addresses(zone, raw);
            if zone.addresses != before {
                history.record_edit(id, &before, &zone.addresses);
                sync.record_leader(id, sync_leader(zone, &self.mode));
            }
        }

        let annotations = self.validator().revalidate(&next, id, previous, &history);
        Ok(UpdateOutcome {
            table: next,
            annotations,
            history,
            sync,
        })
    }

    /// Validates the whole table.
    #[must_use]
    pub fn validate(
        &self,
        table: &TopologyTable,
        history: &AddressHistory,
        strict: bool,
    ) -> ErrorAnnotations {
        self.validator().validate_table(table, history, strict)
    }

    /// Reconciles component server lists with the table's addresses.
    ///
    /// Returns the components whose chosen servers changed.
    pub fn sync_component_servers<'a>(
        &self,
        table: &TopologyTable,
        lists: impl IntoIterator<Item = &'a mut ComponentServers>,
    ) -> SyncReport {
        let available = table.all_addresses();
        let mut report = SyncReport::default();
        for list in lists {
            if list.sync(&available) {
                report.components.push(list.component().clone());
            }
        }
        report
    }

    /// Builds a table from a saved payload.
    ///
    /// Loaded rows are pristine; the leader is read from either payload key.
    /// Zero zones yield the initial table, a payload below the mode's minimum
    /// is padded with default-named rows, and the default flag is repaired to
    /// exactly one row in multi-zone modes.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralRefusal::MaxZones`] when the payload holds more
    /// zones than the mode allows.
    pub fn load(&self, payload: &TopologyPayload) -> Result<TopologyTable, StructuralRefusal> {
        if let Some(max) = self.mode.max_zones
            && payload.zones.len() > max
        {
            return Err(StructuralRefusal::MaxZones {
                max,
            });
        }
        if payload.zones.is_empty() {
            return Ok(self.initial_table());
        }
        let zones = payload
            .zones
            .iter()
            .map(|entry| {
                let mut zone = Zone::new(ZoneId::new(0), entry.name.trim());
                self.apply_addresses(&mut zone, &entry.addresses);
                zone.leader = entry.leader_value().map(|value| value.trim().to_string());
                zone.is_default = entry.is_default;
                zone
            })
            .collect();
        let mut table = TopologyTable::from_zones(zones);
        table.fill_to_minimum(&self.mode);
        if self.mode.enforces_default() {
            let keep = table
                .default_zone()
                .or_else(|| table.zones().first())
                .map(|zone| zone.id);
            for zone in table.zones_mut() {
                zone.is_default = Some(zone.id) == keep;
            }
        }
        Ok(table)
    }

    /// Replaces a zone's raw and normalized addresses.
    fn apply_addresses<S: AsRef<str>>(&self, zone: &mut Zone, raw: &[S]) {
        let input = AddressInput::from_raw(raw, &self.syntax);
        zone.raw_addresses = raw
            .iter()
            .map(|entry| entry.as_ref().trim())
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        zone.addresses = input.set;
    }

    /// Strict address normalization with this engine's host syntax.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry.
    pub fn normalize_addresses<S: AsRef<str>>(
        &self,
        raw: &[S],
    ) -> Result<AddressSet, AddressError> {
        AddressSet::normalize(raw, &self.syntax)
    }
}
