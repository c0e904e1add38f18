// crates/topology-core/src/core/error.rs
// ============================================================================
// Module: Topology Errors
// Description: Caller-facing failures of engine operations.
// Purpose: Separate structural refusals and bad requests from field errors.
// Dependencies: thiserror, crate::core::{identifiers, zone}
// ============================================================================

//! ## Overview
//! Field-level problems are annotations, never errors. The types here cover
//! requests the engine cannot apply at all: unknown rows or components,
//! mistyped raw values, and structural refusals that the presentation layer
//! is expected to prevent by disabling the triggering action.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::ComponentId;
use crate::core::identifiers::ZoneId;
use crate::core::zone::ZoneField;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Actions the engine refuses because they would break a table invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructuralRefusal {
    /// Deleting would leave fewer than the minimum number of zones.
    #[error("at least {min} zone(s) must remain")]
    LastZone {
        /// Minimum zone count of the mode.
        min: usize,
    },
    /// Adding would exceed the maximum number of zones.
    #[error("at most {max} zone(s) are allowed")]
    MaxZones {
        /// Maximum zone count of the mode.
        max: usize,
    },
    /// Clearing the flag would leave no default zone.
    #[error("exactly one zone must remain the default")]
    DefaultRequired,
}

/// Errors returned by engine and session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// No zone with the given identifier exists.
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),
    /// Component is not part of the dependency graph.
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
    /// Component has no configured server list.
    #[error("component {0} has no server list")]
    NoServerList(ComponentId),
    /// Raw value type does not fit the edited field.
    #[error("field {field} expects {expected}")]
    FieldValueMismatch {
        /// Edited field.
        field: ZoneField,
        /// Expected value shape.
        expected: &'static str,
    },
    /// Action refused to preserve a table invariant.
    #[error("refused: {0}")]
    Refused(#[from] StructuralRefusal),
}
