// crates/topology-core/src/core/zone.rs
// ============================================================================
// Module: Zones
// Description: A named group of server addresses playing one deployment role.
// Purpose: Define the zone row, its editable fields and partial updates.
// Dependencies: serde, crate::core::{address, identifiers}
// ============================================================================

//! ## Overview
//! A [`Zone`] (region) bundles a UI-only identifier, a name, a normalized
//! [`AddressSet`], an optional leader and the default flag. The raw address
//! entries are kept next to the normalized set so fragments typed mid-entry
//! can be annotated and re-rendered without being lost.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::address::AddressSet;
use crate::core::identifiers::ZoneId;

// ============================================================================
// SECTION: Fields
// ============================================================================

/// Editable field of a zone row, used to key annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneField {
    /// Zone/region name.
    Name,
    /// Server address list.
    Addresses,
    /// Leader address or access URL.
    Leader,
    /// Default/favorite flag.
    IsDefault,
}

impl ZoneField {
    /// Returns a stable label for the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Addresses => "addresses",
            Self::Leader => "leader",
            Self::IsDefault => "is_default",
        }
    }
}

impl fmt::Display for ZoneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Zone
// ============================================================================

/// One row of the topology table.
///
/// # Invariants
/// - `addresses` holds exactly the valid, unique entries of `raw_addresses`.
/// - `revision` increases on every user edit and is never serialized to the
///   backend payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// UI-only row key.
    pub id: ZoneId,
    /// Zone/region label.
    pub name: String,
    /// Trimmed raw entries as last submitted, including invalid fragments.
    pub raw_addresses: Vec<String>,
    /// Normalized address set.
    pub addresses: AddressSet,
    /// Leader address (or access URL) when set.
    pub leader: Option<String>,
    /// Default/favorite flag.
    pub is_default: bool,
    /// Per-row edit counter.
    pub revision: u64,
}

impl Zone {
    /// Creates an empty, pristine zone.
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            raw_addresses: Vec::new(),
            addresses: AddressSet::new(),
            leader: None,
            is_default: false,
            revision: 0,
        }
    }

    /// Returns true when the user has never edited the row.
    #[must_use]
    pub const fn is_pristine(&self) -> bool {
        self.revision == 0
    }
}

// ============================================================================
// SECTION: Patches
// ============================================================================

/// Partial update of a zone row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New full address list (replace-whole-set).
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
    /// New leader; `Some(None)` clears it.
    #[serde(default)]
    pub leader: Option<Option<String>>,
    /// New default flag.
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl ZonePatch {
    /// Patch setting the name.
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::default()
        }
    }

    /// Patch replacing the address list.
    #[must_use]
    pub fn addresses<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            addresses: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Patch setting or clearing the leader.
    #[must_use]
    pub fn leader(value: Option<String>) -> Self {
        Self {
            leader: Some(value),
            ..Self::default()
        }
    }

    /// Patch setting the default flag.
    #[must_use]
    pub fn is_default(value: bool) -> Self {
        Self {
            is_default: Some(value),
            ..Self::default()
        }
    }

    /// Returns the fields this patch touches.
    #[must_use]
    pub fn fields(&self) -> Vec<ZoneField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(ZoneField::Name);
        }
        if self.addresses.is_some() {
            fields.push(ZoneField::Addresses);
        }
        if self.leader.is_some() {
            fields.push(ZoneField::Leader);
        }
        if self.is_default.is_some() {
            fields.push(ZoneField::IsDefault);
        }
        fields
    }

    /// Returns true when the patch touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
