// crates/topology-core/src/runtime/resolver.rs
// ============================================================================
// Module: Component Dependency Resolver
// Description: Applies component toggles with transitive cascade.
// Purpose: Keep the selection closed under the dependency graph.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Selecting a component also selects everything it transitively implies.
//! Deselecting a component also deselects everything that transitively
//! implies it, since those components cannot run without it. Starting from a
//! consistent selection, every toggle yields a consistent selection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::ComponentGraph;
use crate::core::ComponentId;
use crate::core::ComponentSelection;
use crate::core::TopologyError;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Applies one toggle to `selection`.
///
/// # Errors
///
/// Returns [`TopologyError::UnknownComponent`] when `id` is not in `graph`.
pub fn toggle(
    graph: &ComponentGraph,
    selection: &ComponentSelection,
    id: &ComponentId,
    selected: bool,
) -> Result<ComponentSelection, TopologyError> {
    if !graph.contains(id) {
        return Err(TopologyError::UnknownComponent(id.clone()));
    }
    if selected {
        let mut added = graph.implies(id);
        added.insert(id.clone());
        Ok(selection.with(&added))
    } else {
        let mut removed = graph.implied_by(id);
        removed.insert(id.clone());
        Ok(selection.without(&removed))
    }
}

/// Closes an arbitrary starting selection under the graph.
///
/// Unknown identifiers are rejected; each known one is toggled on in order.
///
/// # Errors
///
/// Returns [`TopologyError::UnknownComponent`] for the first unknown id.
pub fn select_all<'a>(
    graph: &ComponentGraph,
    ids: impl IntoIterator<Item = &'a ComponentId>,
) -> Result<ComponentSelection, TopologyError> {
    let mut selection = ComponentSelection::new();
    for id in ids {
        selection = toggle(graph, &selection, id, true)?;
    }
    Ok(selection)
}

/// Components whose state differs between two selections.
#[must_use]
pub fn changed_components(
    before: &ComponentSelection,
    after: &ComponentSelection,
) -> BTreeSet<ComponentId> {
    let before: BTreeSet<&ComponentId> = before.iter().collect();
    let after: BTreeSet<&ComponentId> = after.iter().collect();
    before.symmetric_difference(&after).map(|id| (*id).clone()).collect()
}
