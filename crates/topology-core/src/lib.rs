// crates/topology-core/src/lib.rs
// ============================================================================
// Module: Topology Core Library
// Description: Public API surface for the topology configuration engine.
// Purpose: Expose topology types, host syntax, runtime and audit sinks.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Topology core backs a multi-step deployment wizard. The user declares an
//! ordered table of zones (each with a name, a set of server addresses, an
//! optional leader and a default flag) and picks optional components whose
//! dependencies cascade. The engine keeps cross-row invariants, derived
//! fields and the component selection consistent after every discrete edit,
//! and refuses to emit a backend payload while any error remains.
//!
//! The crate is rendering-agnostic: the presentation layer reports events and
//! renders [`SessionSnapshot`] values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use audit::AuditAction;
pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::WizardAuditEvent;
pub use audit::WizardAuditEventParams;
pub use audit::WizardAuditSink;
pub use interfaces::HostSyntax;
pub use interfaces::StandardHostSyntax;
pub use runtime::AccessUrl;
pub use runtime::ComponentServers;
pub use runtime::CrossRowValidator;
pub use runtime::EventOutcome;
pub use runtime::LeaderChange;
pub use runtime::ProgrammaticChange;
pub use runtime::ServerCardinality;
pub use runtime::SessionSnapshot;
pub use runtime::SubmitError;
pub use runtime::SyncReport;
pub use runtime::TopologyEngine;
pub use runtime::UpdateOutcome;
pub use runtime::WizardSession;
pub use runtime::sync_leader;
