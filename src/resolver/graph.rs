//! Graph building for repository dependencies
//!
//! ## Graph Structure
//!
//! The dependency graph maps each repository to the repositories it depends
//! on:
//!
//! ```text
//! BTreeMap<String, BTreeSet<String>>
//!    ↓                  ↓
//!  repo_name      {dep1, dep2, dep3}
//! ```
//!
//! Edges pointing at repositories outside the node set are dropped when the
//! graph is built: dependency metadata is often incomplete, and an unknown
//! dependency must not block ordering of the repositories we do know. A
//! repository depending on itself keeps that edge and sorts as a cycle.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::Repository;

/// Directed depends-on graph over repository names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub(crate) nodes: BTreeSet<String>,
    /// `repo → {dependency, ...}`, restricted to known nodes
    pub(crate) edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build a graph from repositories
    ///
    /// Repositories with unknown dependency metadata contribute a node
    /// without edges.
    pub fn build<'a>(repos: impl IntoIterator<Item = &'a Repository>) -> Self {
        let repos: Vec<&Repository> = repos.into_iter().collect();
        let pairs = repos.iter().map(|repo| {
            (
                repo.name.as_str(),
                repo.dependencies.as_deref().unwrap_or_default(),
            )
        });
        Self::from_pairs(pairs)
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a [String])> + Clone) -> Self {
        let nodes: BTreeSet<String> = pairs.clone().map(|(name, _)| name.to_string()).collect();
        let mut edges: BTreeMap<String, BTreeSet<String>> = nodes
            .iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();

        for (name, deps) in pairs {
            for dep in deps {
                if !nodes.contains(dep) {
                    debug!(repo = %name, dependency = %dep, "Ignoring unknown dependency");
                    continue;
                }
                if let Some(targets) = edges.get_mut(name) {
                    targets.insert(dep.clone());
                }
            }
        }

        Self { nodes, edges }
    }

    /// All node names, sorted
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Known dependencies of a node
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple() {
        let repos = [
            Repository::new("bootstrap", &["console"]),
            Repository::new("console", &[]),
        ];
        let graph = DependencyGraph::build(&repos);

        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.dependencies_of("bootstrap").collect::<Vec<_>>(),
            vec!["console"]
        );
        assert_eq!(graph.dependencies_of("console").count(), 0);
    }

    #[test]
    fn test_build_ignores_unknown_dependencies() {
        let repos = [Repository::new("ingress-nginx", &["bootstrap", "cert-manager"])];
        let graph = DependencyGraph::build(&repos);

        assert_eq!(graph.dependencies_of("ingress-nginx").count(), 0);
    }

    #[test]
    fn test_build_without_metadata() {
        let repos = [Repository {
            name: "monitoring".to_string(),
            dependencies: None,
            description: None,
        }];
        let graph = DependencyGraph::build(&repos);

        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["monitoring"]);
    }

    #[test]
    fn test_build_keeps_self_dependency() {
        let repos = [Repository::new("console", &["console"])];
        let graph = DependencyGraph::build(&repos);

        assert_eq!(
            graph.dependencies_of("console").collect::<Vec<_>>(),
            vec!["console"]
        );
    }
}
