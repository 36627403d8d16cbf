// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic directed acyclic dependency graph.
//!
//! Edges point from a dependency to its dependents. Adding an edge that
//! would close a cycle is rejected and leaves the graph unchanged.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Check whether `to` can be reached from `from` by following `successors`.
///
/// A node always reaches itself. Used both by [`DependencyGraph`] and by
/// network connection validation.
pub fn is_reachable<T, F, I>(from: &T, to: &T, successors: F) -> bool
where
    T: Eq + Hash + Clone,
    F: Fn(&T) -> I,
    I: IntoIterator<Item = T>,
{
    let mut visited = HashSet::new();
    let mut stack = vec![from.clone()];
    while let Some(current) = stack.pop() {
        if current == *to {
            return true;
        }
        if visited.insert(current.clone()) {
            stack.extend(successors(&current));
        }
    }
    false
}

/// A set of nodes with dependency edges and an optional info payload per node
#[derive(Debug, Clone)]
pub struct DependencyGraph<T, I = ()> {
    nodes: IndexSet<T>,
    /// dependency -> dependents
    downstream: IndexMap<T, IndexSet<T>>,
    /// dependent -> dependencies
    upstream: IndexMap<T, IndexSet<T>>,
    info: IndexMap<T, I>,
}

impl<T, I> Default for DependencyGraph<T, I> {
    fn default() -> Self {
        Self {
            nodes: IndexSet::new(),
            downstream: IndexMap::new(),
            upstream: IndexMap::new(),
            info: IndexMap::new(),
        }
    }
}

impl<T, I> DependencyGraph<T, I>
where
    T: Eq + Hash + Clone + Debug,
{
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Adding an existing node does nothing.
    pub fn add_node(&mut self, node: T) {
        self.nodes.insert(node);
    }

    /// Check if a node is registered
    pub fn contains(&self, node: &T) -> bool {
        self.nodes.contains(node)
    }

    /// All registered nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }

    /// Number of registered nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Record that `dependent` depends on `dependency`
    pub fn add_dependency(&mut self, dependency: T, dependent: T) -> Result<(), DependencyError> {
        if dependency == dependent {
            return Err(DependencyError::SelfDependency(format!("{dependency:?}")));
        }
        if is_reachable(&dependent, &dependency, |n| self.dependents(n).cloned().collect::<Vec<_>>()) {
            return Err(DependencyError::Cycle {
                dependency: format!("{dependency:?}"),
                dependent: format!("{dependent:?}"),
            });
        }
        self.nodes.insert(dependency.clone());
        self.nodes.insert(dependent.clone());
        self.upstream
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
        self.downstream.entry(dependency).or_default().insert(dependent);
        Ok(())
    }

    /// Record a dependency and attach `info` to the dependent
    pub fn add_dependency_with_info(
        &mut self,
        dependency: T,
        dependent: T,
        info: I,
    ) -> Result<(), DependencyError> {
        self.add_dependency(dependency, dependent.clone())?;
        self.info.insert(dependent, info);
        Ok(())
    }

    /// Remove a single edge. Returns whether anything was removed.
    pub fn remove_dependency(&mut self, dependency: &T, dependent: &T) -> bool {
        let removed_up = remove_from(&mut self.upstream, dependent, dependency);
        let removed_down = remove_from(&mut self.downstream, dependency, dependent);
        removed_up || removed_down
    }

    /// Check for the edge `dependency -> dependent`
    pub fn has_dependency(&self, dependency: &T, dependent: &T) -> bool {
        self.upstream
            .get(dependent)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// Nodes `node` depends on
    pub fn dependencies(&self, node: &T) -> impl Iterator<Item = &T> {
        self.upstream.get(node).into_iter().flatten()
    }

    /// Nodes that depend on `node`
    pub fn dependents(&self, node: &T) -> impl Iterator<Item = &T> {
        self.downstream.get(node).into_iter().flatten()
    }

    /// Remove every edge into `dependent`. Returns whether it had any.
    pub fn remove_dependencies(&mut self, dependent: &T) -> bool {
        let Some(dependencies) = self.upstream.shift_remove(dependent) else {
            return false;
        };
        for dependency in &dependencies {
            remove_from(&mut self.downstream, dependency, dependent);
        }
        true
    }

    /// Remove every edge out of `dependency`. Returns whether it had any.
    pub fn remove_dependents(&mut self, dependency: &T) -> bool {
        let Some(dependents) = self.downstream.shift_remove(dependency) else {
            return false;
        };
        for dependent in &dependents {
            remove_from(&mut self.upstream, dependent, dependency);
        }
        true
    }

    /// Nodes without dependencies
    pub fn top_nodes(&self) -> Vec<T> {
        self.nodes
            .iter()
            .filter(|node| !self.upstream.contains_key(*node))
            .cloned()
            .collect()
    }

    /// Nodes grouped in layers: layer 0 holds the top nodes, and a node
    /// appears in the layer after the last of its dependencies.
    pub fn layers(&self) -> Vec<Vec<T>> {
        let mut remaining: IndexMap<&T, usize> = self
            .nodes
            .iter()
            .map(|node| (node, self.upstream.get(node).map_or(0, IndexSet::len)))
            .collect();
        let mut layers = Vec::new();
        let mut current: Vec<T> = self.top_nodes();

        while !current.is_empty() {
            let mut next = Vec::new();
            for node in &current {
                for dependent in self.dependents(node) {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }
            layers.push(current);
            current = next;
        }
        layers
    }

    /// Iterate over all nodes layer by layer
    pub fn breadth_first(&self) -> impl Iterator<Item = T> {
        self.layers().into_iter().flatten()
    }

    /// Info attached to a node
    pub fn info(&self, node: &T) -> Option<&I> {
        self.info.get(node)
    }

    /// Attach info to a node
    pub fn set_info(&mut self, node: T, info: I) {
        self.info.insert(node, info);
    }

    /// Remove the info attached to a node
    pub fn remove_info(&mut self, node: &T) -> Option<I> {
        self.info.shift_remove(node)
    }

    /// All attached infos
    pub fn infos(&self) -> impl Iterator<Item = &I> {
        self.info.values()
    }
}

fn remove_from<T: Eq + Hash>(map: &mut IndexMap<T, IndexSet<T>>, key: &T, value: &T) -> bool {
    let Some(set) = map.get_mut(key) else {
        return false;
    };
    let removed = set.shift_remove(value);
    if set.is_empty() {
        map.shift_remove(key);
    }
    removed
}

/// Error when adding a dependency
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// A node cannot depend on itself
    #[error("The dependency {0} refers to itself")]
    SelfDependency(String),

    /// Edge would close a cycle
    #[error("Adding a dependency from {dependent} to {dependency} would cause a cycle")]
    Cycle {
        /// Node depended upon
        dependency: String,
        /// Depending node
        dependent: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph<char> {
        // A <- B <- C
        let mut graph = DependencyGraph::new();
        graph.add_dependency('A', 'B').unwrap();
        graph.add_dependency('B', 'C').unwrap();
        graph
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut graph = DependencyGraph::<char>::new();
        graph.add_dependency('A', 'B').unwrap();
        assert!(matches!(graph.add_dependency('B', 'A'), Err(DependencyError::Cycle { .. })));
        assert!(matches!(graph.add_dependency('A', 'A'), Err(DependencyError::SelfDependency(_))));
        // Rejected edges leave the graph untouched
        assert!(!graph.has_dependency(&'B', &'A'));
        assert!(graph.has_dependency(&'A', &'B'));

        let mut graph = chain();
        assert!(graph.add_dependency('C', 'A').is_err());
    }

    #[test]
    fn test_top_nodes() {
        let graph = chain();
        assert_eq!(graph.top_nodes(), vec!['A']);

        let mut graph = graph;
        graph.add_node('D');
        graph.add_node('D');
        assert_eq!(graph.top_nodes(), vec!['A', 'D']);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_remove_dependencies_only_touches_incoming_edges() {
        let mut graph = DependencyGraph::<char>::new();
        graph.add_dependency('Y', 'Z').unwrap();
        graph.add_dependency('Z', 'W').unwrap();

        assert!(graph.remove_dependencies(&'Z'));
        assert!(!graph.has_dependency(&'Y', &'Z'));
        assert!(graph.has_dependency(&'Z', &'W'));
        assert!(!graph.remove_dependencies(&'Z'));

        assert!(graph.remove_dependents(&'Z'));
        assert!(!graph.has_dependency(&'Z', &'W'));
        assert_eq!(graph.top_nodes(), vec!['Y', 'Z', 'W']);
    }

    #[test]
    fn test_layers() {
        let mut graph = DependencyGraph::<&str>::new();
        graph.add_dependency("a", "c").unwrap();
        graph.add_dependency("b", "c").unwrap();
        graph.add_dependency("c", "d").unwrap();
        graph.add_dependency("a", "d").unwrap();
        graph.add_node("e");

        let layers = graph.layers();
        assert_eq!(layers, vec![vec!["a", "b", "e"], vec!["c"], vec!["d"]]);
        assert_eq!(graph.breadth_first().collect::<Vec<_>>(), ["a", "b", "e", "c", "d"]);
    }

    #[test]
    fn test_remove_single_dependency_and_info() {
        let mut graph = DependencyGraph::<u32, &str>::new();
        graph.add_dependency_with_info(1, 2, "two").unwrap();
        assert_eq!(graph.info(&2), Some(&"two"));
        assert_eq!(graph.dependencies(&2).collect::<Vec<_>>(), [&1]);
        assert_eq!(graph.dependents(&1).collect::<Vec<_>>(), [&2]);

        assert!(graph.remove_dependency(&1, &2));
        assert!(!graph.remove_dependency(&1, &2));
        assert_eq!(graph.top_nodes(), vec![1, 2]);
        assert_eq!(graph.remove_info(&2), Some("two"));
        assert_eq!(graph.infos().count(), 0);
    }

    #[test]
    fn test_reachability() {
        let edges = |n: &u32| match n {
            1 => vec![2, 3],
            3 => vec![4],
            _ => vec![],
        };
        assert!(is_reachable(&1, &4, edges));
        assert!(!is_reachable(&4, &1, edges));
        assert!(is_reachable(&2, &2, edges));
    }
}
