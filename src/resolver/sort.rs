//! Topological sort using Kahn's algorithm
//!
//! ## Algorithm
//!
//! 1. Count, for every repository, how many known dependencies it has.
//! 2. Seed a ready set with every repository that has none.
//! 3. Repeatedly take the lexicographically smallest ready repository,
//!    append it to the order and release its dependents.
//! 4. Repositories still holding dependencies once the ready set drains sit
//!    on, or behind, a cycle.
//!
//! The ready set is a `BTreeSet`, so the output is fully determined by the
//! input graph.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{DeckhandError, Result};
use crate::resolver::graph::DependencyGraph;

/// Order repositories so that every repository follows its dependencies
///
/// # Errors
///
/// Returns [`DeckhandError::CircularDependency`] naming every repository that
/// could not be ordered. A partial order is never returned.
///
/// # Example
///
/// ```text
/// Dependencies:
///   console        → []
///   bootstrap      → [console]
///   ingress-nginx  → [bootstrap]
///
/// Result: [console, bootstrap, ingress-nginx]
/// ```
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for node in graph.nodes() {
        in_degree.insert(node, graph.dependencies_of(node).count());
        for dep in graph.dependencies_of(node) {
            dependents.entry(dep).or_default().push(node);
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());

        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() < graph.len() {
        let cycle = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(DeckhandError::CircularDependency { cycle });
    }

    Ok(order)
}

/// Keep only the repositories in `changed`, preserving `order`
pub fn filter_to_changed(order: &[String], changed: &HashSet<String>) -> Vec<String> {
    order
        .iter()
        .filter(|name| changed.contains(name.as_str()))
        .cloned()
        .collect()
}
