// crates/topology-core/src/core/mod.rs
// ============================================================================
// Module: Topology Core Types
// Description: Canonical topology model, events, payloads and errors.
// Purpose: Provide stable, serializable types shared by engine and callers.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define the zone table, the component graph, the inbound event
//! boundary and the backend payload. They carry no engine logic beyond local
//! invariants; cross-row behavior lives in [`crate::runtime`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod address;
pub mod annotations;
pub mod components;
pub mod error;
pub mod events;
pub mod identifiers;
pub mod mode;
pub mod payload;
pub mod table;
pub mod zone;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use address::Address;
pub use address::AddressError;
pub use address::AddressInput;
pub use address::AddressSet;
pub use address::split_address_text;
pub use annotations::AnnotationKey;
pub use annotations::ErrorAnnotations;
pub use annotations::ErrorCategory;
pub use annotations::FieldError;
pub use components::ComponentGraph;
pub use components::ComponentGraphError;
pub use components::ComponentSelection;
pub use error::StructuralRefusal;
pub use error::TopologyError;
pub use events::ComponentServersEvent;
pub use events::ComponentToggleEvent;
pub use events::NameCheckRequest;
pub use events::NameCheckResult;
pub use events::NameTarget;
pub use events::RawValue;
pub use events::RowDeleteEvent;
pub use events::RowEditEvent;
pub use events::WizardEvent;
pub use identifiers::ComponentId;
pub use identifiers::ZoneId;
pub use mode::DEFAULT_ACCESS_PORT;
pub use mode::DEFAULT_ACCESS_SCHEME;
pub use mode::DeploymentMode;
pub use mode::DuplicateScope;
pub use mode::LeaderMode;
pub use mode::NameGrammar;
pub use mode::ZoneNaming;
pub use payload::ComponentPayload;
pub use payload::DeploymentPayload;
pub use payload::TopologyPayload;
pub use payload::ZonePayload;
pub use table::AddressHistory;
pub use table::TopologyTable;
pub use zone::Zone;
pub use zone::ZoneField;
pub use zone::ZonePatch;
