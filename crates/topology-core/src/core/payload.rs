// crates/topology-core/src/core/payload.rs
// ============================================================================
// Module: Topology Payloads
// Description: Persisted and transmitted shape of a topology declaration.
// Purpose: Define the backend payload and map tables onto it.
// Dependencies: serde, crate::core::{identifiers, mode, table}
// ============================================================================

//! ## Overview
//! The payload is an ordered list of zones with plain-string addresses, an
//! optional leader (`leader` for address leaders, `cm_url` for access URLs)
//! and the default flag. UI-only fields (row id, revision, raw input) never
//! appear here. The same shape is used to reload a saved topology.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ComponentId;
use crate::core::mode::DeploymentMode;
use crate::core::mode::LeaderMode;
use crate::core::table::TopologyTable;

// ============================================================================
// SECTION: Payload Types
// ============================================================================

/// One zone as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePayload {
    /// Zone/region name.
    pub name: String,
    /// Server addresses as plain strings.
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Leader address (address-leader modes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    /// Access URL (access-URL modes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cm_url: Option<String>,
    /// Default/favorite flag.
    #[serde(default)]
    pub is_default: bool,
}

impl ZonePayload {
    /// Returns the leader value regardless of which key carried it.
    #[must_use]
    pub fn leader_value(&self) -> Option<&str> {
        self.leader.as_deref().or(self.cm_url.as_deref())
    }
}

/// Ordered list of zones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyPayload {
    /// Zones in table order.
    #[serde(default)]
    pub zones: Vec<ZonePayload>,
}

impl TopologyPayload {
    /// Projects a table onto the backend payload shape.
    #[must_use]
    pub fn from_table(table: &TopologyTable, mode: &DeploymentMode) -> Self {
        let zones = table
            .zones()
            .iter()
            .map(|zone| {
                let (leader, cm_url) = match mode.leader {
                    LeaderMode::Disabled => (None, None),
                    LeaderMode::Address => (zone.leader.clone(), None),
                    LeaderMode::AccessUrl {
                        ..
                    } => (None, zone.leader.clone()),
                };
                ZonePayload {
                    name: zone.name.clone(),
                    addresses: zone.addresses.to_strings(),
                    leader,
                    cm_url,
                    is_default: zone.is_default,
                }
            })
            .collect();
        Self {
            zones,
        }
    }
}

/// Server list of one selected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPayload {
    /// Component identifier.
    pub id: ComponentId,
    /// Servers the component is deployed to (empty when it has no list).
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Full submission payload handed to the deployment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    /// Deployment name, when the wizard asks for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    /// Zone topology.
    pub topology: TopologyPayload,
    /// Selected components, in identifier order.
    #[serde(default)]
    pub components: Vec<ComponentPayload>,
}
