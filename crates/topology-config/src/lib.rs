// crates/topology-config/src/lib.rs
// ============================================================================
// Module: Topology Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for topology-wizard.toml semantics.
// Dependencies: topology-core, serde, toml
// ============================================================================

//! ## Overview
//! `topology-config` defines the configuration model for the topology wizard:
//! which deployment mode the engine runs in, the component dependency graph,
//! per-component server lists and the audit sink. Validation is strict and
//! fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
