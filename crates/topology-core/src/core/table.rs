// crates/topology-core/src/core/table.rs
// ============================================================================
// Module: Topology Table
// Description: Ordered collection of zone rows and its lifecycle operations.
// Purpose: Own row creation/deletion and the minimum-row and default invariants.
// Dependencies: serde, crate::core::{address, error, identifiers, mode, zone}
// ============================================================================

//! ## Overview
//! The table is a value: lifecycle operations return a new table rather than
//! mutating in place, so the presentation layer holds the only mutable
//! reference. Structural refusals (deleting the last row, exceeding the row
//! cap, clearing the only default) are exposed up front through the `can_*`
//! queries so actions can be disabled.
//!
//! [`AddressHistory`] is the session shadow of addresses removed from zones by
//! row edits; it backs the session-wide duplicate scope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::address::Address;
use crate::core::address::AddressSet;
use crate::core::error::StructuralRefusal;
use crate::core::error::TopologyError;
use crate::core::identifiers::ZoneId;
use crate::core::mode::DeploymentMode;
use crate::core::mode::ZoneNaming;
use crate::core::zone::Zone;

// ============================================================================
// SECTION: Topology Table
// ============================================================================

/// Ordered list of zones.
///
/// # Invariants
/// - Zone identifiers are unique and never reused (`next_id` only grows).
/// - After initialization the table holds at least the mode's minimum rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyTable {
    /// Rows in display order.
    zones: Vec<Zone>,
    /// Next identifier to hand out.
    #[serde(skip)]
    next_id: u64,
}

impl TopologyTable {
    /// Creates the initial table: the mode's minimum number of pristine
    /// zones, the first one flagged as default.
    #[must_use]
    pub fn initial(mode: &DeploymentMode) -> Self {
        let mut table = Self {
            zones: Vec::new(),
            next_id: 1,
        };
        table.fill_to_minimum(mode);
        if let Some(first) = table.zones.first_mut() {
            first.is_default = true;
        }
        table
    }

    /// Builds a table from already-constructed zones, reassigning identifiers.
    #[must_use]
    pub fn from_zones(zones: Vec<Zone>) -> Self {
        let mut next_id = 1;
        let zones = zones
            .into_iter()
            .map(|mut zone| {
                zone.id = ZoneId::new(next_id);
                next_id += 1;
                zone
            })
            .collect();
        Self {
            zones,
            next_id,
        }
    }

    /// Returns the rows in order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Looks up a zone by identifier.
    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Looks up a zone by identifier for mutation.
    pub(crate) fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|zone| zone.id == id)
    }

    /// Mutable access to every row.
    pub(crate) fn zones_mut(&mut self) -> &mut [Zone] {
        &mut self.zones
    }

    /// Returns the zone currently flagged as default.
    #[must_use]
    pub fn default_zone(&self) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.is_default)
    }

    /// Deduplicated union of every zone's addresses, in zone order.
    #[must_use]
    pub fn all_addresses(&self) -> AddressSet {
        let mut all = AddressSet::new();
        for zone in &self.zones {
            for address in &zone.addresses {
                all.insert(address.clone());
            }
        }
        all
    }

    /// Computes the next default name: one above the largest suffix in use.
    ///
    /// Suffixes at `u64::MAX` cannot be incremented and are skipped; when the
    /// incremented suffix is itself taken, the smallest free suffix is used.
    #[must_use]
    pub fn next_default_name(&self, naming: ZoneNaming) -> String {
        let used: BTreeSet<u64> =
            self.zones.iter().filter_map(|zone| naming.suffix_of(&zone.name)).collect();
        let suffix = used
            .iter()
            .rev()
            .find_map(|suffix| suffix.checked_add(1))
            .filter(|candidate| !used.contains(candidate))
            .or_else(|| (1..=u64::MAX).find(|candidate| !used.contains(candidate)))
            .unwrap_or(1);
        naming.format(suffix)
    }

    /// Returns true when another row may be added.
    #[must_use]
    pub fn can_add(&self, mode: &DeploymentMode) -> bool {
        mode.max_zones.is_none_or(|max| self.zones.len() < max)
    }

    /// Returns true when the row may be deleted.
    #[must_use]
    pub fn can_delete(&self, mode: &DeploymentMode, id: ZoneId) -> bool {
        self.get(id).is_some() && self.zones.len() > mode.effective_min_zones()
    }

    /// Returns true when the row's default flag may be cleared.
    #[must_use]
    pub fn can_clear_default(&self, mode: &DeploymentMode, id: ZoneId) -> bool {
        if !mode.enforces_default() {
            return true;
        }
        self.get(id).is_some_and(|zone| !zone.is_default)
    }

    /// Appends a new empty zone with a computed default name.
    ///
    /// The new zone becomes the default only when no default exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralRefusal::MaxZones`] when the row cap is reached.
    pub fn add_zone(&self, mode: &DeploymentMode) -> Result<(Self, ZoneId), StructuralRefusal> {
        if !self.can_add(mode) {
            return Err(StructuralRefusal::MaxZones {
                max: mode.max_zones.unwrap_or(self.zones.len()),
            });
        }
        let mut next = self.clone();
        let id = ZoneId::new(next.next_id);
        next.next_id += 1;
        let mut zone = Zone::new(id, self.next_default_name(mode.naming));
        zone.is_default = mode.enforces_default() && self.default_zone().is_none();
        next.zones.push(zone);
        Ok((next, id))
    }

    /// Appends pristine default-named zones until the mode's minimum is met.
    pub(crate) fn fill_to_minimum(&mut self, mode: &DeploymentMode) {
        while self.zones.len() < mode.effective_min_zones() {
            let id = ZoneId::new(self.next_id);
            self.next_id += 1;
            let zone = Zone::new(id, self.next_default_name(mode.naming));
            self.zones.push(zone);
        }
    }

    /// Removes a zone, promoting the first remaining row when it was default.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownZone`] for a missing row and
    /// [`StructuralRefusal::LastZone`] when the minimum would be violated.
    pub fn delete_zone(&self, mode: &DeploymentMode, id: ZoneId) -> Result<Self, TopologyError> {
        let Some(position) = self.zones.iter().position(|zone| zone.id == id) else {
            return Err(TopologyError::UnknownZone(id));
        };
        if !self.can_delete(mode, id) {
            return Err(StructuralRefusal::LastZone {
                min: mode.effective_min_zones(),
            }
            .into());
        }
        let mut next = self.clone();
        let removed = next.zones.remove(position);
        if removed.is_default
            && mode.enforces_default()
            && let Some(first) = next.zones.first_mut()
        {
            first.is_default = true;
        }
        Ok(next)
    }
}

// ============================================================================
// SECTION: Address History
// ============================================================================

/// Addresses removed from zones by row edits during the current session.
///
/// # Invariants
/// - Each address maps to the zone that most recently released it.
/// - Entries of deleted zones are purged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressHistory {
    /// Released address to releasing zone.
    released: BTreeMap<Address, ZoneId>,
}

impl AddressHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            released: BTreeMap::new(),
        }
    }

    /// Records an address-set replacement on `zone`.
    ///
    /// Addresses dropped from the zone are remembered; addresses the zone takes
    /// back are forgotten.
    pub fn record_edit(&mut self, zone: ZoneId, before: &AddressSet, after: &AddressSet) {
        for address in before.difference(after) {
            self.released.insert(address, zone);
        }
        for address in after {
            if self.released.get(address) == Some(&zone) {
                self.released.remove(address);
            }
        }
    }

    /// Forgets everything released by a deleted zone.
    pub fn forget_zone(&mut self, zone: ZoneId) {
        self.released.retain(|_, holder| *holder != zone);
    }

    /// Returns the zone that released `address`, when it is not `zone` itself.
    #[must_use]
    pub fn released_by_other(&self, address: &Address, zone: ZoneId) -> Option<ZoneId> {
        self.released.get(address).copied().filter(|holder| *holder != zone)
    }

    /// Returns true when nothing has been released.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}
