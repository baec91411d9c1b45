//! The snapshot aggregate: one full ingestion of a dated structure file

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{HierarchyGraph, HierarchyView};
use crate::model::*;

/// (source path, central-administration filter): at most one snapshot each.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub source_path: String,
    pub central_administration_only: bool,
}

impl SnapshotKey {
    pub fn new(source_path: impl Into<String>, central_administration_only: bool) -> Self {
        SnapshotKey {
            source_path: source_path.into(),
            central_administration_only,
        }
    }

    pub fn snapshot_id(&self) -> SnapshotId {
        SnapshotId::for_key(&self.source_path, self.central_administration_only)
    }

    /// File stem of the source, e.g. `2023` for `data/2023.csv`.
    pub fn date_label(&self) -> String {
        Path::new(&self.source_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.clone())
    }
}

/// Derived lookup structures, built on first query.
#[derive(Debug)]
struct SnapshotIndex {
    graph: HierarchyGraph,
    by_identifier: HashMap<Identifier, usize>,
}

/// Immutable result of a successful build. Owns every node and edge; the
/// graph view is recomputed from them on demand.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    id: SnapshotId,
    key: SnapshotKey,
    date_label: String,
    root_identifier: Identifier,
    built_at: DateTime<Utc>,
    /// Arena in creation order; `NodeId(n)` is `nodes[n]`.
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    documents: Vec<DocumentReference>,
    #[serde(skip)]
    index: OnceLock<SnapshotIndex>,
}

impl Snapshot {
    pub(crate) fn from_parts(
        key: SnapshotKey,
        root_identifier: Identifier,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        documents: Vec<DocumentReference>,
    ) -> Self {
        Snapshot {
            id: key.snapshot_id(),
            date_label: key.date_label(),
            key,
            root_identifier,
            built_at: Utc::now(),
            nodes,
            edges,
            documents,
            index: OnceLock::new(),
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn key(&self) -> &SnapshotKey {
        &self.key
    }

    pub fn source_path(&self) -> &str {
        &self.key.source_path
    }

    pub fn central_administration_only(&self) -> bool {
        self.key.central_administration_only
    }

    pub fn date_label(&self) -> &str {
        &self.date_label
    }

    pub fn root_identifier(&self) -> Identifier {
        self.root_identifier
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Every node in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.nodes.iter().filter_map(Node::as_unit)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.nodes.iter().filter_map(Node::as_position)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn documents(&self) -> &[DocumentReference] {
        &self.documents
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn index(&self) -> &SnapshotIndex {
        self.index.get_or_init(|| {
            tracing::debug!("Indexing snapshot {} ({} nodes)", self.date_label, self.nodes.len());
            SnapshotIndex {
                graph: HierarchyGraph::from_parts(
                    self.nodes.iter().map(Node::identifier),
                    &self.edges,
                ),
                by_identifier: self
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| (node.identifier(), i))
                    .collect(),
            }
        })
    }

    /// The adjacency view over this snapshot's edges.
    pub fn graph(&self) -> &HierarchyGraph {
        &self.index().graph
    }

    pub fn node(&self, identifier: &Identifier) -> Option<&Node> {
        self.index()
            .by_identifier
            .get(identifier)
            .map(|&i| &self.nodes[i])
    }

    pub fn unit(&self, identifier: &Identifier) -> Option<&Unit> {
        self.node(identifier).and_then(Node::as_unit)
    }

    pub fn position(&self, identifier: &Identifier) -> Option<&Position> {
        self.node(identifier).and_then(Node::as_position)
    }
}

impl HierarchyView for Snapshot {
    fn hierarchy(&self) -> &HierarchyGraph {
        self.graph()
    }

    fn name_of(&self, identifier: &Identifier) -> Option<&str> {
        self.node(identifier).map(Node::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_date_label() {
        assert_eq!(SnapshotKey::new("data/2023.csv", true).date_label(), "2023");
        assert_eq!(SnapshotKey::new("2025-03", false).date_label(), "2025-03");
    }
}
