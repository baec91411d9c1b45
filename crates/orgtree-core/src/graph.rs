//! Adjacency index over identifiers, backed by petgraph::DiGraph

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::model::{Edge, Identifier};

/// Directed hierarchy keyed by [`Identifier`]. Children are reported in the
/// order their edges were added.
#[derive(Clone)]
pub struct HierarchyGraph {
    inner: DiGraph<Identifier, ()>,
    index: HashMap<Identifier, NodeIndex>,
}

impl std::fmt::Debug for HierarchyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl HierarchyGraph {
    pub fn new() -> Self {
        HierarchyGraph {
            inner: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Rebuild the index from owned collections.
    pub fn from_parts<'a>(
        nodes: impl IntoIterator<Item = Identifier>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> Self {
        let mut graph = HierarchyGraph::new();
        for identifier in nodes {
            graph.add_node(identifier);
        }
        for edge in edges {
            graph.add_edge(edge.source, edge.target);
        }
        graph
    }

    /// Insert a node. Returns false if it was already present.
    pub fn add_node(&mut self, identifier: Identifier) -> bool {
        if self.index.contains_key(&identifier) {
            return false;
        }
        let idx = self.inner.add_node(identifier);
        self.index.insert(identifier, idx);
        true
    }

    /// Insert `source -> target`, adding missing endpoints. Returns false if
    /// the edge already existed.
    pub fn add_edge(&mut self, source: Identifier, target: Identifier) -> bool {
        self.add_node(source);
        self.add_node(target);
        let (s, t) = (self.index[&source], self.index[&target]);
        if self.inner.contains_edge(s, t) {
            return false;
        }
        self.inner.add_edge(s, t, ());
        true
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// All direct parents of a node.
    pub fn predecessors(&self, identifier: &Identifier) -> Vec<Identifier> {
        let Some(&idx) = self.index.get(identifier) else {
            return Vec::new();
        };
        self.inner
            .neighbors_directed(idx, Direction::Incoming)
            .map(|p| self.inner[p])
            .collect()
    }

    /// The first direct parent, if any.
    pub fn parent(&self, identifier: &Identifier) -> Option<Identifier> {
        let idx = *self.index.get(identifier)?;
        self.inner
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|p| self.inner[p])
    }

    /// Direct children in insertion order.
    pub fn children(&self, identifier: &Identifier) -> Vec<Identifier> {
        let Some(&idx) = self.index.get(identifier) else {
            return Vec::new();
        };
        let mut outgoing: Vec<_> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id().index(), e.target()))
            .collect();
        outgoing.sort_unstable_by_key(|(edge, _)| *edge);
        outgoing.into_iter().map(|(_, t)| self.inner[t]).collect()
    }

    /// Pre-order walk below `identifier`, the node itself first. Children are
    /// visited in insertion order, which makes the walk order deterministic.
    pub fn preorder(&self, identifier: &Identifier) -> Vec<Identifier> {
        if !self.contains(identifier) {
            return Vec::new();
        }
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![*identifier];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for child in self.children(&current).into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
        order
    }

    /// Sort key placing `target` where [`HierarchyGraph::preorder`] from
    /// `from` would visit it: the insertion indices of the incoming edges on
    /// the path down from `from`. `None` if `from` is not an ancestor of
    /// `target` (a node is its own ancestor, with an empty key).
    pub fn preorder_key(&self, target: &Identifier, from: &Identifier) -> Option<Vec<usize>> {
        let from = *self.index.get(from)?;
        let mut current = *self.index.get(target)?;
        let mut key = Vec::new();
        while current != from {
            if key.len() > self.node_count() {
                return None;
            }
            let edge = self
                .inner
                .edges_directed(current, Direction::Incoming)
                .next()?;
            key.push(edge.id().index());
            current = edge.source();
        }
        key.reverse();
        Some(key)
    }

    /// Descendants of `identifier`, always including itself when present.
    pub fn descendants(&self, identifier: &Identifier) -> HashSet<Identifier> {
        self.preorder(identifier).into_iter().collect()
    }

    /// Identifiers from `from` down to `target`, both inclusive, found by
    /// walking single parents upward. `None` if `from` is not an ancestor.
    pub fn path_between(&self, target: &Identifier, from: &Identifier) -> Option<Vec<Identifier>> {
        if !self.contains(target) {
            return None;
        }
        let mut path = vec![*target];
        let mut current = *target;
        while current != *from {
            // Bounded so a malformed cycle cannot spin forever.
            if path.len() > self.node_count() {
                return None;
            }
            current = self.parent(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Iterate over all node identifiers, in insertion order.
    pub fn identifiers(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.inner.node_indices().map(move |idx| self.inner[idx])
    }
}

/// Read access shared by the in-progress builder and committed snapshots.
pub trait HierarchyView {
    fn hierarchy(&self) -> &HierarchyGraph;

    fn name_of(&self, identifier: &Identifier) -> Option<&str>;

    /// Every node carrying `name`, in no particular order. Implementors that
    /// keep a name index should override the full scan.
    fn nodes_named(&self, name: &str) -> Vec<Identifier> {
        self.hierarchy()
            .identifiers()
            .filter(|id| self.name_of(id) == Some(name))
            .collect()
    }

    /// Display names from `from` down to `target`.
    fn name_path(&self, target: &Identifier, from: &Identifier) -> Option<Vec<String>> {
        self.hierarchy()
            .path_between(target, from)?
            .iter()
            .map(|id| self.name_of(id).map(str::to_string))
            .collect()
    }
}

impl Default for HierarchyGraph {
    fn default() -> Self {
        Self::new()
    }
}
