// crates/topology-core/src/core/annotations.rs
// ============================================================================
// Module: Error Annotations
// Description: Field-level validation results keyed by zone and field.
// Purpose: Carry recoverable errors to the presentation layer without throwing.
// Dependencies: serde, thiserror, crate::core::{address, identifiers, zone}
// ============================================================================

//! ## Overview
//! Validation never fails an edit; it produces [`FieldError`] values attached
//! to `(zone, field)` keys. Errors fall into three categories: syntax errors,
//! invariant violations and external (backend) failures. Duplicate errors
//! always name the other zone involved so symmetric clearing can be checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

use crate::core::address::Address;
use crate::core::identifiers::ZoneId;
use crate::core::zone::ZoneField;

// ============================================================================
// SECTION: Field Errors
// ============================================================================

/// Error category used to order and filter annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Value is not well-formed.
    Syntax,
    /// Table-wide invariant violated.
    Invariant,
    /// Backend validation failure.
    External,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    /// Name does not match the zone name grammar.
    #[error("invalid zone name: {reason}")]
    InvalidName {
        /// Violated grammar rule.
        reason: String,
    },
    /// Another zone uses the same name.
    #[error("zone name {name} is also used by zone {zone}")]
    DuplicateName {
        /// Conflicting name.
        name: String,
        /// Other zone using the name.
        zone: ZoneId,
    },
    /// Backend reported the name as taken.
    #[error("name {name} is not available")]
    NameUnavailable {
        /// Rejected name.
        name: String,
    },
    /// Address entry does not match the host syntax.
    #[error("invalid address: {entry}")]
    InvalidAddress {
        /// Offending trimmed entry.
        entry: String,
    },
    /// Address was entered more than once in this zone.
    #[error("address {address} is listed more than once")]
    DuplicateWithinZone {
        /// Repeated address.
        address: Address,
    },
    /// Address is also present in another zone.
    #[error("address {address} is also used by zone {zone}")]
    DuplicateAcrossZones {
        /// Shared address.
        address: Address,
        /// Other zone holding the address.
        zone: ZoneId,
    },
    /// Address was assigned to another zone earlier in this session.
    #[error("address {address} was assigned to zone {zone} earlier in this session")]
    AddressHeldEarlier {
        /// Previously assigned address.
        address: Address,
        /// Zone that held the address.
        zone: ZoneId,
    },
    /// Zone has no addresses.
    #[error("at least one address is required")]
    AddressesRequired,
    /// Leader is not one of the zone's addresses.
    #[error("leader {leader} is not an address of this zone")]
    LeaderNotInZone {
        /// Current leader value.
        leader: String,
    },
    /// Access URL is malformed.
    #[error("invalid access url {value}: {reason}")]
    InvalidAccessUrl {
        /// Current leader value.
        value: String,
        /// Parse failure description.
        reason: String,
    },
    /// Another zone uses the same access URL.
    #[error("access url {url} is also used by zone {zone}")]
    DuplicateAccessUrl {
        /// Shared URL.
        url: String,
        /// Other zone using the URL.
        zone: ZoneId,
    },
    /// Leader is required but empty.
    #[error("a leader must be selected")]
    LeaderRequired,
}

impl FieldError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName {
                ..
            }
            | Self::InvalidAddress {
                ..
            }
            | Self::InvalidAccessUrl {
                ..
            } => ErrorCategory::Syntax,
            Self::NameUnavailable {
                ..
            } => ErrorCategory::External,
            _ => ErrorCategory::Invariant,
        }
    }

    /// Returns the other zone referenced by a duplicate error, if any.
    #[must_use]
    pub const fn other_zone(&self) -> Option<ZoneId> {
        match self {
            Self::DuplicateName {
                zone,
                ..
            }
            | Self::DuplicateAcrossZones {
                zone,
                ..
            }
            | Self::AddressHeldEarlier {
                zone,
                ..
            }
            | Self::DuplicateAccessUrl {
                zone,
                ..
            } => Some(*zone),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Annotations
// ============================================================================

/// Annotation key: one field of one zone.
pub type AnnotationKey = (ZoneId, ZoneField);

/// Mapping of `(zone, field)` to the errors shown on that field.
///
/// # Invariants
/// - No key maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAnnotations {
    /// Errors by key, ordered by zone then field.
    entries: BTreeMap<AnnotationKey, Vec<FieldError>>,
}

impl ErrorAnnotations {
    /// Creates an empty annotation set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds an error to a field, skipping exact duplicates.
    pub fn push(&mut self, zone: ZoneId, field: ZoneField, error: FieldError) {
        let errors = self.entries.entry((zone, field)).or_default();
        if !errors.contains(&error) {
            errors.push(error);
        }
    }

    /// Returns the errors for one field.
    #[must_use]
    pub fn get(&self, zone: ZoneId, field: ZoneField) -> &[FieldError] {
        self.entries.get(&(zone, field)).map_or(&[], Vec::as_slice)
    }

    /// Returns all errors of one zone, across fields.
    pub fn for_zone(&self, zone: ZoneId) -> impl Iterator<Item = (ZoneField, &FieldError)> {
        self.entries
            .iter()
            .filter(move |((id, _), _)| *id == zone)
            .flat_map(|((_, field), errors)| errors.iter().map(move |error| (*field, error)))
    }

    /// Drops every error of one field.
    pub fn clear_field(&mut self, zone: ZoneId, field: ZoneField) {
        self.entries.remove(&(zone, field));
    }

    /// Drops every error attached to one zone.
    pub fn clear_zone(&mut self, zone: ZoneId) {
        self.entries.retain(|(id, _), _| *id != zone);
    }

    /// Keeps only the errors matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(ZoneId, ZoneField, &FieldError) -> bool) {
        for ((zone, field), errors) in &mut self.entries {
            errors.retain(|error| keep(*zone, *field, error));
        }
        self.entries.retain(|_, errors| !errors.is_empty());
    }

    /// Merges another annotation set into this one.
    pub fn merge(&mut self, other: Self) {
        for ((zone, field), errors) in other.entries {
            for error in errors {
                self.push(zone, field, error);
            }
        }
    }

    /// Returns true when no field carries an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the total number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Iterates over `(zone, field, errors)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, ZoneField, &[FieldError])> {
        self.entries.iter().map(|((zone, field), errors)| (*zone, *field, errors.as_slice()))
    }
}

/// Serialized form of one annotation entry.
#[derive(Serialize)]
struct AnnotationEntry<'a> {
    /// Zone identifier.
    zone_id: ZoneId,
    /// Annotated field.
    field: ZoneField,
    /// Errors on the field.
    errors: &'a [FieldError],
}

impl Serialize for ErrorAnnotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(zone_id, field, errors)| AnnotationEntry {
            zone_id,
            field,
            errors,
        }))
    }
}
