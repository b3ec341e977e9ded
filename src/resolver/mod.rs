//! Dependency resolution for installed repositories
//!
//! This module handles:
//! - Building the depends-on graph from installation records ([`graph`])
//! - Ordering repositories with Kahn's algorithm ([`sort`])
//! - Falling back to the recorded order when no dependency metadata exists

pub mod graph;
pub mod sort;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::Installation;
use crate::error::Result;

pub use graph::DependencyGraph;
pub use sort::{filter_to_changed, topological_sort};

/// Whether any installation declares its dependencies
fn has_dependency_metadata(installations: &[Installation]) -> bool {
    installations
        .iter()
        .any(|i| i.repository.dependencies.is_some())
}

/// Order installation names so dependencies come first
///
/// When no installation carries dependency metadata the recorded order is
/// returned unchanged. A cycle is always an error; it never falls back.
pub fn sorted_names(installations: &[Installation]) -> Result<Vec<String>> {
    if !has_dependency_metadata(installations) {
        warn!("No dependency metadata found, using installation order");
        return Ok(installations
            .iter()
            .map(|i| i.name().to_string())
            .collect());
    }

    let graph = DependencyGraph::build(installations.iter().map(|i| &i.repository));
    let order = topological_sort(&graph)?;
    debug!(order = ?order, "Resolved deployment order");
    Ok(order)
}

/// Deployment order restricted to repositories in `changed`
pub fn sorted_changed_names(
    installations: &[Installation],
    changed: &HashSet<String>,
) -> Result<Vec<String>> {
    let order = sorted_names(installations)?;
    Ok(filter_to_changed(&order, changed))
}
