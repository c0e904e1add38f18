// crates/topology-core/src/core/components.rs
// ============================================================================
// Module: Component Graph
// Description: Fixed dependency graph over optional deployable components.
// Purpose: Declare which components imply others and answer closure queries.
// Dependencies: serde, thiserror, crate::core::identifiers
// ============================================================================

//! ## Overview
//! The graph maps each component of a fixed universe to the components it
//! implies. Selection cascades downward along `implies`; deselection cascades
//! upward along the inverse `implied_by`. Both closures are transitive so a
//! selection that is consistent with the graph stays consistent after any
//! toggle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ComponentId;

// ============================================================================
// SECTION: Standard Components
// ============================================================================

/// Database proxy.
pub const PROXY: &str = "proxy";
/// Host agent.
pub const AGENT: &str = "agent";
/// Metrics collector.
pub const COLLECTOR: &str = "collector";
/// Time-series database backing monitoring.
pub const TIME_SERIES_DB: &str = "time-series-db";
/// Monitoring dashboard.
pub const DASHBOARD: &str = "dashboard";
/// Alert manager.
pub const ALERTING: &str = "alerting";
/// Configuration server.
pub const CONFIG_SERVER: &str = "config-server";

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Set of components currently selected for deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSelection(BTreeSet<ComponentId>);

impl ComponentSelection {
    /// Creates an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true when `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.0.contains(id)
    }

    /// Returns the selected identifiers in order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentId> {
        self.0.iter()
    }

    /// Returns the number of selected components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the union with `ids`.
    #[must_use]
    pub(crate) fn with(&self, ids: &BTreeSet<ComponentId>) -> Self {
        Self(self.0.union(ids).cloned().collect())
    }

    /// Returns the selection minus `ids`.
    #[must_use]
    pub(crate) fn without(&self, ids: &BTreeSet<ComponentId>) -> Self {
        Self(self.0.difference(ids).cloned().collect())
    }
}

impl FromIterator<ComponentId> for ComponentSelection {
    fn from_iter<T: IntoIterator<Item = ComponentId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Graph declaration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentGraphError {
    /// Component declared twice.
    #[error("component {0} declared more than once")]
    DuplicateComponent(ComponentId),
    /// Component implies itself.
    #[error("component {0} implies itself")]
    SelfDependency(ComponentId),
    /// Dependency is not a declared component.
    #[error("component {component} implies undeclared component {dependency}")]
    UnknownDependency {
        /// Declaring component.
        component: ComponentId,
        /// Undeclared dependency.
        dependency: ComponentId,
    },
}

// ============================================================================
// SECTION: Graph
// ============================================================================

/// Directed dependency graph over the component universe.
///
/// # Invariants
/// - Every component of the universe is a key of both maps.
/// - `implied_by` is the exact inverse of `implies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentGraph {
    /// Direct dependencies per component.
    implies: BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    /// Direct dependents per component.
    implied_by: BTreeMap<ComponentId, BTreeSet<ComponentId>>,
}

impl ComponentGraph {
    /// Builds a graph from `(component, direct dependencies)` declarations.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentGraphError`] for duplicate declarations,
    /// self-dependencies or undeclared dependencies.
    pub fn new<I, D>(declarations: I) -> Result<Self, ComponentGraphError>
    where
        I: IntoIterator<Item = (ComponentId, D)>,
        D: IntoIterator<Item = ComponentId>,
    {
        let mut implies: BTreeMap<ComponentId, BTreeSet<ComponentId>> = BTreeMap::new();
        for (component, dependencies) in declarations {
            if implies.contains_key(&component) {
                return Err(ComponentGraphError::DuplicateComponent(component));
            }
            let dependencies: BTreeSet<ComponentId> = dependencies.into_iter().collect();
            if dependencies.contains(&component) {
                return Err(ComponentGraphError::SelfDependency(component));
            }
            implies.insert(component, dependencies);
        }
        for (component, dependencies) in &implies {
            if let Some(dependency) = dependencies.iter().find(|dep| !implies.contains_key(*dep)) {
                return Err(ComponentGraphError::UnknownDependency {
                    component: component.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
        Ok(Self::from_checked(implies))
    }

    /// Standard graph: dashboard and alerting both imply the collector and
    /// the time-series database; proxy, agent and config server stand alone.
    #[must_use]
    pub fn standard() -> Self {
        let monitoring: BTreeSet<ComponentId> =
            [COLLECTOR, TIME_SERIES_DB].into_iter().map(ComponentId::from).collect();
        let mut implies: BTreeMap<ComponentId, BTreeSet<ComponentId>> = BTreeMap::new();
        for standalone in [PROXY, AGENT, CONFIG_SERVER, COLLECTOR, TIME_SERIES_DB] {
            implies.insert(ComponentId::from(standalone), BTreeSet::new());
        }
        implies.insert(ComponentId::from(DASHBOARD), monitoring.clone());
        implies.insert(ComponentId::from(ALERTING), monitoring);
        Self::from_checked(implies)
    }

    /// Builds the inverse map for an already-validated declaration.
    fn from_checked(implies: BTreeMap<ComponentId, BTreeSet<ComponentId>>) -> Self {
        let mut implied_by: BTreeMap<ComponentId, BTreeSet<ComponentId>> =
            implies.keys().map(|id| (id.clone(), BTreeSet::new())).collect();
        for (component, dependencies) in &implies {
            for dependency in dependencies {
                implied_by.entry(dependency.clone()).or_default().insert(component.clone());
            }
        }
        Self {
            implies,
            implied_by,
        }
    }

    /// Returns true when `id` belongs to the universe.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.implies.contains_key(id)
    }

    /// Returns the component universe in identifier order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentId> {
        self.implies.keys()
    }

    /// Returns the direct dependencies of `id`.
    #[must_use]
    pub fn direct_implies(&self, id: &ComponentId) -> Option<&BTreeSet<ComponentId>> {
        self.implies.get(id)
    }

    /// Transitive dependencies of `id` (excluding `id`).
    #[must_use]
    pub fn implies(&self, id: &ComponentId) -> BTreeSet<ComponentId> {
        closure(&self.implies, id)
    }

    /// Transitive dependents of `id` (excluding `id`).
    #[must_use]
    pub fn implied_by(&self, id: &ComponentId) -> BTreeSet<ComponentId> {
        closure(&self.implied_by, id)
    }

    /// Returns true when every selected component's dependencies are selected.
    #[must_use]
    pub fn is_consistent(&self, selection: &ComponentSelection) -> bool {
        selection.iter().all(|id| {
            self.implies.get(id).is_some_and(|deps| deps.iter().all(|dep| selection.contains(dep)))
        })
    }
}

impl Default for ComponentGraph {
    fn default() -> Self {
        Self::standard()
    }
}

/// Collects every node reachable from `start` along `edges`, excluding `start`.
fn closure(
    edges: &BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    start: &ComponentId,
) -> BTreeSet<ComponentId> {
    let mut reached = BTreeSet::new();
    let mut stack: Vec<&ComponentId> = edges.get(start).into_iter().flatten().collect();
    while let Some(next) = stack.pop() {
        if next == start || !reached.insert(next.clone()) {
            continue;
        }
        stack.extend(edges.get(next).into_iter().flatten());
    }
    reached
}
