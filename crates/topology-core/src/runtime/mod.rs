// crates/topology-core/src/runtime/mod.rs
// ============================================================================
// Module: Topology Runtime
// Description: Validation, synchronization, cascade and session state.
// Purpose: Turn discrete wizard events into consistent table and selection state.
// Dependencies: crate::{audit, core, interfaces}, url
// ============================================================================

//! ## Overview
//! Runtime modules hold every rule that spans more than one row or component.
//! [`TopologyEngine`] is pure; [`WizardSession`] owns the mutable state and is
//! the single entry point for event handling.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod engine;
pub mod resolver;
pub mod session;
pub mod synchronizer;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::TopologyEngine;
pub use engine::UpdateOutcome;
pub use session::EventOutcome;
pub use session::ProgrammaticChange;
pub use session::SessionSnapshot;
pub use session::SubmitError;
pub use session::WizardSession;
pub use synchronizer::ComponentServers;
pub use synchronizer::LeaderChange;
pub use synchronizer::ServerCardinality;
pub use synchronizer::SyncReport;
pub use synchronizer::sync_leader;
pub use validator::AccessUrl;
pub use validator::CrossRowValidator;
