// crates/topology-core/src/core/events.rs
// ============================================================================
// Module: Wizard Events
// Description: Inbound events reported by the presentation layer.
// Purpose: Define the plain-data boundary the session consumes.
// Dependencies: serde, crate::core::{address, error, identifiers, zone}
// ============================================================================

//! ## Overview
//! The presentation layer reports one discrete event at a time: a row edit,
//! row add/delete, a component toggle, a component server list edit, a
//! deployment rename, or the asynchronous answer of a backend name check.
//! Events serialize with a `type` tag so recorded sessions can be replayed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::address::split_address_text;
use crate::core::error::TopologyError;
use crate::core::identifiers::ComponentId;
use crate::core::identifiers::ZoneId;
use crate::core::zone::ZoneField;
use crate::core::zone::ZonePatch;

// ============================================================================
// SECTION: Raw Values
// ============================================================================

/// Raw field value exactly as the form produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Checkbox/switch value.
    Flag(bool),
    /// Multi-value input.
    List(Vec<String>),
    /// Free-text input.
    Text(String),
}

// ============================================================================
// SECTION: Row Events
// ============================================================================

/// A single field of a row changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowEditEvent {
    /// Edited zone.
    pub zone_id: ZoneId,
    /// Edited field.
    pub field: ZoneField,
    /// New raw value.
    pub raw_value: RawValue,
}

impl RowEditEvent {
    /// Converts the raw value into a typed patch.
    ///
    /// Address text is split on commas, semicolons and whitespace; an empty
    /// leader text clears the leader.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::FieldValueMismatch`] when the raw value shape
    /// does not fit the field.
    pub fn to_patch(&self) -> Result<ZonePatch, TopologyError> {
        match (self.field, &self.raw_value) {
            (ZoneField::Name, RawValue::Text(text)) => Ok(ZonePatch::name(text.trim())),
            (ZoneField::Addresses, RawValue::List(values)) => {
                Ok(ZonePatch::addresses(values.iter().map(String::as_str)))
            }
            (ZoneField::Addresses, RawValue::Text(text)) => {
                Ok(ZonePatch::addresses(split_address_text(text)))
            }
            (ZoneField::Leader, RawValue::Text(text)) => {
                let trimmed = text.trim();
                Ok(ZonePatch::leader((!trimmed.is_empty()).then(|| trimmed.to_string())))
            }
            (ZoneField::IsDefault, RawValue::Flag(flag)) => Ok(ZonePatch::is_default(*flag)),
            (field, _) => Err(TopologyError::FieldValueMismatch {
                field,
                expected: match field {
                    ZoneField::Name | ZoneField::Leader => "text",
                    ZoneField::Addresses => "text or list",
                    ZoneField::IsDefault => "flag",
                },
            }),
        }
    }
}

/// A row was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDeleteEvent {
    /// Deleted zone.
    pub zone_id: ZoneId,
}

// ============================================================================
// SECTION: Component Events
// ============================================================================

/// A component checkbox was toggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentToggleEvent {
    /// Toggled component.
    pub component_id: ComponentId,
    /// New checkbox state.
    pub selected: bool,
}

/// The server list of a component was edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentServersEvent {
    /// Edited component.
    pub component_id: ComponentId,
    /// Full desired server list.
    pub servers: Vec<String>,
}

// ============================================================================
// SECTION: External Name Checks
// ============================================================================

/// Name whose availability the backend checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameTarget {
    /// A zone name.
    Zone {
        /// Zone whose name is checked.
        zone_id: ZoneId,
    },
    /// The deployment name.
    Deployment,
}

/// Outstanding backend name check issued by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCheckRequest {
    /// Checked target.
    pub target: NameTarget,
    /// Name at request time.
    pub name: String,
    /// Target revision at request time.
    pub revision: u64,
}

/// Backend answer to a [`NameCheckRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCheckResult {
    /// Checked target.
    pub target: NameTarget,
    /// Name that was checked.
    pub name: String,
    /// Target revision the check was issued for.
    pub revision: u64,
    /// Whether the backend accepts the name.
    pub available: bool,
}

impl NameCheckRequest {
    /// Builds the result the backend would return for this request.
    #[must_use]
    pub fn resolve(&self, available: bool) -> NameCheckResult {
        NameCheckResult {
            target: self.target,
            name: self.name.clone(),
            revision: self.revision,
            available,
        }
    }
}

// ============================================================================
// SECTION: Event Envelope
// ============================================================================

/// Any inbound event, tagged for recording and replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    /// Row field edit.
    RowEdit(RowEditEvent),
    /// Row added.
    RowAdd,
    /// Row deleted.
    RowDelete(RowDeleteEvent),
    /// Component toggled.
    ComponentToggle(ComponentToggleEvent),
    /// Component server list edited.
    ComponentServers(ComponentServersEvent),
    /// Deployment name edited.
    DeploymentRename {
        /// New deployment name.
        name: String,
    },
    /// Backend name check answer arrived.
    NameCheck(NameCheckResult),
}
