// crates/topology-core/src/runtime/synchronizer.rs
// ============================================================================
// Module: Derived Field Synchronizer
// Description: Keeps leaders and component server lists consistent with zones.
// Purpose: Recompute derived fields when the addresses they depend on change.
// Dependencies: serde, crate::{core, runtime::validator}
// ============================================================================

//! ## Overview
//! Two kinds of fields derive from zone addresses:
//! - the per-zone leader (an address, or an access URL embedding one);
//! - the per-component server lists, drawn from the union of all addresses.
//!
//! Synchronization keeps a user choice whenever it is still valid and falls
//! back to the first available address otherwise. Values typed by the user
//! that never came from a zone ("custom" entries) are preserved. Every
//! programmatic change is reported so callers can surface it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::AddressSet;
use crate::core::ComponentId;
use crate::core::DeploymentMode;
use crate::core::LeaderMode;
use crate::core::Zone;
use crate::core::ZoneId;
use crate::runtime::validator::AccessUrl;

// ============================================================================
// SECTION: Leader Sync
// ============================================================================

/// Effect of leader synchronization on one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaderChange {
    /// Leader left as is.
    Kept,
    /// Leader replaced by a value derived from the first address.
    Reselected {
        /// Previous leader, if any.
        previous: Option<String>,
        /// New leader.
        leader: String,
    },
    /// Leader cleared because the zone has no addresses.
    Cleared {
        /// Previous leader.
        previous: String,
    },
}

impl LeaderChange {
    /// Returns true when the leader value changed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Kept)
    }
}

/// Reconciles the zone leader with its (already updated) address set.
///
/// The current leader is kept while its host is a member; otherwise the
/// first address is chosen, and with no addresses the leader is cleared.
/// Access-URL leaders keep their scheme and port when they parse, falling
/// back to the mode defaults.
pub fn sync_leader(zone: &mut Zone, mode: &DeploymentMode) -> LeaderChange {
    let current_host = match (&mode.leader, zone.leader.as_deref()) {
        (LeaderMode::Disabled, _) | (_, None) => None,
        (LeaderMode::Address, Some(leader)) => Some(leader.to_string()),
        (
            LeaderMode::AccessUrl {
                ..
            },
            Some(leader),
        ) => AccessUrl::parse(leader).ok().map(|url| url.host),
    };
    if matches!(mode.leader, LeaderMode::Disabled) {
        return LeaderChange::Kept;
    }
    if current_host.as_deref().is_some_and(|host| zone.addresses.contains_str(host)) {
        return LeaderChange::Kept;
    }
    let Some(first) = zone.addresses.first() else {
        return match zone.leader.take() {
            Some(previous) => LeaderChange::Cleared {
                previous,
            },
            None => LeaderChange::Kept,
        };
    };
    let leader = match &mode.leader {
        LeaderMode::AccessUrl {
            scheme,
            port,
        } => {
            let (scheme, port) = zone
                .leader
                .as_deref()
                .and_then(|value| AccessUrl::parse(value).ok())
                .map_or_else(|| (scheme.clone(), *port), |url| (url.scheme, url.port));
            AccessUrl::format(&scheme, first.as_str(), port)
        }
        _ => first.as_str().to_string(),
    };
    let previous = zone.leader.replace(leader.clone());
    LeaderChange::Reselected {
        previous,
        leader,
    }
}

// ============================================================================
// SECTION: Component Server Lists
// ============================================================================

/// How many servers a component may be deployed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerCardinality {
    /// Exactly one server.
    Single,
    /// Any number of servers.
    #[default]
    Multiple,
}

/// Server list of one component, drawn from the table's addresses.
///
/// # Invariants
/// - `selected` holds no duplicates.
/// - `Single` lists hold at most one entry.
/// - Every entry is either a current zone address or in `custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentServers {
    /// Owning component.
    component: ComponentId,
    /// Allowed list size.
    cardinality: ServerCardinality,
    /// Chosen servers in order.
    selected: Vec<String>,
    /// Entries typed by the user that are not zone addresses.
    custom: BTreeSet<String>,
}

impl ComponentServers {
    /// Creates an empty list.
    #[must_use]
    pub const fn new(component: ComponentId, cardinality: ServerCardinality) -> Self {
        Self {
            component,
            cardinality,
            selected: Vec::new(),
            custom: BTreeSet::new(),
        }
    }

    /// Returns the owning component.
    #[must_use]
    pub const fn component(&self) -> &ComponentId {
        &self.component
    }

    /// Returns the allowed list size.
    #[must_use]
    pub const fn cardinality(&self) -> ServerCardinality {
        self.cardinality
    }

    /// Returns the chosen servers.
    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Returns the user-typed entries that are not zone addresses.
    #[must_use]
    pub const fn custom(&self) -> &BTreeSet<String> {
        &self.custom
    }

    /// Applies a user edit of the whole list.
    ///
    /// Entries are trimmed and deduplicated; entries absent from `available`
    /// are remembered as custom. A single-server list keeps the last entry.
    pub fn edit<S: AsRef<str>>(&mut self, servers: &[S], available: &AddressSet) {
        let mut selected: Vec<String> = Vec::new();
        for server in servers {
            let trimmed = server.as_ref().trim();
            if trimmed.is_empty() || selected.iter().any(|entry| entry == trimmed) {
                continue;
            }
            selected.push(trimmed.to_string());
        }
        if self.cardinality == ServerCardinality::Single && selected.len() > 1 {
            selected.drain(..selected.len() - 1);
        }
        self.custom =
            selected.iter().filter(|entry| !available.contains_str(entry)).cloned().collect();
        self.selected = selected;
    }

    /// Reconciles the list with the current address union.
    ///
    /// Entries that are neither zone addresses nor custom are dropped; an
    /// emptied list falls back to the first available address. Custom entries
    /// that became zone addresses stop being custom. Returns true when the
    /// chosen servers changed.
    pub fn sync(&mut self, available: &AddressSet) -> bool {
        let mut kept: Vec<String> = self
            .selected
            .iter()
            .filter(|entry| available.contains_str(entry) || self.custom.contains(*entry))
            .cloned()
            .collect();
        if kept.is_empty()
            && let Some(first) = available.first()
        {
            kept.push(first.as_str().to_string());
        }
        if self.cardinality == ServerCardinality::Single {
            kept.truncate(1);
        }
        self.custom.retain(|entry| !available.contains_str(entry));
        let changed = kept != self.selected;
        self.selected = kept;
        changed
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Programmatic changes made while processing one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Leader changes per zone.
    pub leaders: Vec<(ZoneId, LeaderChange)>,
    /// Components whose server list changed.
    pub components: Vec<ComponentId>,
}

impl SyncReport {
    /// Returns true when nothing changed programmatically.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty() && self.components.is_empty()
    }

    /// Records a leader change, ignoring no-ops.
    pub fn record_leader(&mut self, zone: ZoneId, change: LeaderChange) {
        if change.is_change() {
            self.leaders.push((zone, change));
        }
    }
}
