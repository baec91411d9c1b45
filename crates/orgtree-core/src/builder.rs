//! Row-by-row construction of a snapshot

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use crate::config::{BuildConfig, ParentOverride};
use crate::documents::document_urls;
use crate::error::{OrgTreeError, Result};
use crate::fields::{Field, Row, RowReader};
use crate::graph::{HierarchyGraph, HierarchyView};
use crate::identity::{identifier_for, position_segment};
use crate::model::*;
use crate::resolver::{ParentResolver, Resolution};
use crate::snapshot::{Snapshot, SnapshotKey};

/// Where the builder is in the row stream. Finishing the builder is the
/// terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// The next row is the root entity.
    AwaitingRoot,
    /// Subordinate rows resolve their parents below this jurisdiction.
    BuildingJurisdiction(Identifier),
}

/// Accumulates nodes and edges for one snapshot. Nothing here is visible to
/// other callers until [`SnapshotBuilder::finish`] hands back a [`Snapshot`];
/// dropping the builder on error discards all partial state.
pub struct SnapshotBuilder<'c> {
    config: &'c BuildConfig,
    key: SnapshotKey,
    snapshot_id: SnapshotId,
    date_label: String,
    root_identifier: Identifier,
    state: BuildState,
    nodes: Vec<Node>,
    by_identifier: HashMap<Identifier, usize>,
    by_name: HashMap<String, Vec<Identifier>>,
    graph: HierarchyGraph,
    edges: Vec<Edge>,
    documents: Vec<DocumentReference>,
    seen_documents: HashSet<(Identifier, String)>,
    skipped_rows: usize,
}

impl<'c> SnapshotBuilder<'c> {
    pub fn new(config: &'c BuildConfig, key: SnapshotKey) -> Self {
        SnapshotBuilder {
            config,
            snapshot_id: key.snapshot_id(),
            date_label: key.date_label(),
            root_identifier: identifier_for(&[config.root_name.as_str()]),
            key,
            state: BuildState::AwaitingRoot,
            nodes: Vec::new(),
            by_identifier: HashMap::new(),
            by_name: HashMap::new(),
            graph: HierarchyGraph::new(),
            edges: Vec::new(),
            documents: Vec::new(),
            seen_documents: HashSet::new(),
            skipped_rows: 0,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn root_identifier(&self) -> Identifier {
        self.root_identifier
    }

    /// Process one row. Rows must arrive in file order.
    pub fn ingest(&mut self, row: &Row) -> Result<()> {
        row.check_layout()?;
        match self.state {
            BuildState::AwaitingRoot => self.ingest_root(row),
            BuildState::BuildingJurisdiction(current) => {
                if self.key.central_administration_only
                    && row.extract(Field::TipoAdministracion)? != self.config.central_administration_value
                {
                    self.skipped_rows += 1;
                    return Ok(());
                }
                self.ingest_member(row, current)
            }
        }
    }

    /// Validate and seal the snapshot.
    pub fn finish(self) -> Result<Snapshot> {
        if self.state == BuildState::AwaitingRoot {
            return Err(OrgTreeError::EmptyInput);
        }
        for node in &self.nodes {
            let identifier = node.identifier();
            let predecessors = self.graph.predecessors(&identifier).len();
            let expected = usize::from(identifier != self.root_identifier);
            if predecessors != expected {
                return Err(OrgTreeError::StructuralIntegrity {
                    identifier,
                    predecessors,
                });
            }
        }
        tracing::info!(
            "Built snapshot {} ({} nodes, {} edges, {} rows filtered out)",
            self.date_label,
            self.nodes.len(),
            self.edges.len(),
            self.skipped_rows
        );
        Ok(Snapshot::from_parts(
            self.key,
            self.root_identifier,
            self.nodes,
            self.edges,
            self.documents,
        ))
    }

    fn ingest_root(&mut self, row: &Row) -> Result<()> {
        let declared = row.extract(Field::Unidad)?;
        let root_name = self.config.root_name.clone();
        if declared != root_name {
            tracing::warn!(
                "Root row names `{}`; using configured root name `{}`",
                declared,
                root_name
            );
        }
        let root = self.root_identifier;
        self.insert_unit(row, &root_name, root, None)?;
        self.add_position(row, root)?;
        self.record_documents(row, root)?;
        self.state = BuildState::BuildingJurisdiction(root);
        Ok(())
    }

    fn ingest_member(&mut self, row: &Row, current: Identifier) -> Result<()> {
        let known_parts = known_path_parts(row)?;
        let unit_name = row.extract(Field::Unidad)?;

        let unit = if known_parts.len() == 1 {
            let identifier = self.unit_identifier(unit_name, self.root_identifier)?;
            if self.by_identifier.contains_key(&identifier) {
                identifier
            } else {
                let created = self.add_unit(row, unit_name, self.root_identifier)?;
                tracing::debug!("Row {}: jurisdiction `{}`", row.number, unit_name);
                self.state = BuildState::BuildingJurisdiction(created);
                created
            }
        } else {
            let mut expected_path = known_parts;
            if let Some(own) = expected_path.iter().position(|part| part == unit_name) {
                expected_path.remove(own);
            }
            let parent = self.resolve_parent(row, current, &expected_path)?;
            self.add_unit(row, unit_name, parent)?
        };

        self.add_position(row, unit)?;
        self.record_documents(row, unit)
    }

    fn resolve_parent(
        &mut self,
        row: &Row,
        scope: Identifier,
        expected_path: &[String],
    ) -> Result<Identifier> {
        let unit_name = row.extract(Field::Unidad)?;
        let mut declared = row.extract(Field::ReportaA)?.to_string();
        let forced = self
            .config
            .override_for(&self.date_label, unit_name)
            .cloned();
        if let Some(forced) = &forced {
            tracing::warn!(
                "Row {}: parent of `{}` overridden from `{}` to `{}`",
                row.number,
                unit_name,
                declared,
                forced.parent
            );
            declared = forced.parent.clone();
        }

        let resolved = ParentResolver::new(&*self, scope).resolve(&declared, expected_path);
        match (resolved, forced) {
            (Some(resolved), _) => {
                if let Resolution::BestOverlap { tied, .. } = resolved.resolution {
                    if tied > 0 {
                        tracing::debug!(
                            "Row {}: `{}` tied with {} other candidates, took the first",
                            row.number,
                            declared,
                            tied
                        );
                    }
                }
                tracing::debug!(
                    "Row {}: `{}` reports to {} ({:?})",
                    row.number,
                    unit_name,
                    resolved.identifier,
                    resolved.resolution
                );
                Ok(resolved.identifier)
            }
            (None, Some(ParentOverride { parent, create_under: Some(anchor), .. })) => {
                self.fabricate_parent(row, scope, &parent, &anchor, expected_path)
            }
            (None, _) => Err(OrgTreeError::UnresolvableParent {
                row: row.number,
                unit: unit_name.to_string(),
                reports_to: declared,
            }),
        }
    }

    /// Create a unit that the data references but never declares, under
    /// `anchor`. The unit borrows the row's attributes and gets no position.
    fn fabricate_parent(
        &mut self,
        row: &Row,
        scope: Identifier,
        name: &str,
        anchor: &str,
        expected_path: &[String],
    ) -> Result<Identifier> {
        let Some(anchor_id) = ParentResolver::new(&*self, scope)
            .resolve(anchor, expected_path)
            .map(|r| r.identifier)
        else {
            return Err(OrgTreeError::UnresolvableParent {
                row: row.number,
                unit: name.to_string(),
                reports_to: anchor.to_string(),
            });
        };
        tracing::warn!(
            "Row {}: creating undeclared unit `{}` under `{}`; the placement is assumed",
            row.number,
            name,
            anchor
        );
        self.add_unit(row, name, anchor_id)
    }

    fn unit_identifier(&self, unit_name: &str, parent: Identifier) -> Result<Identifier> {
        let mut path = self.path_names(&parent)?;
        if path.last().map(String::as_str) != Some(unit_name) {
            path.push(unit_name.to_string());
        }
        Ok(identifier_for(&path))
    }

    fn path_names(&self, identifier: &Identifier) -> Result<Vec<String>> {
        self.name_path(identifier, &self.root_identifier)
            .ok_or(OrgTreeError::NotFound {
                identifier: *identifier,
            })
    }

    /// Create the unit `name` under `parent`, or return the existing one with
    /// the same identifier.
    fn add_unit(&mut self, row: &Row, name: &str, parent: Identifier) -> Result<Identifier> {
        let identifier = self.unit_identifier(name, parent)?;
        if self.by_identifier.contains_key(&identifier) {
            return Ok(identifier);
        }
        self.insert_unit(row, name, identifier, Some(parent))?;
        Ok(identifier)
    }

    fn insert_unit(
        &mut self,
        row: &Row,
        name: &str,
        identifier: Identifier,
        parent: Option<Identifier>,
    ) -> Result<()> {
        let unit = Unit {
            id: NodeId(self.nodes.len() as u64),
            name: name.to_string(),
            identifier,
            snapshot_id: self.snapshot_id,
            short_name: row.extract(Field::NombreCorto)?.to_string(),
            administration_type: AdministrationType::parse(row.extract(Field::TipoAdministracion)?),
            unit_class: UnitClass::parse(row.extract(Field::UnidadClase)?),
            range: row.extract(Field::UnidadRango)?.to_string(),
        };
        self.insert_node(Node::Unit(unit), parent);
        Ok(())
    }

    fn add_position(&mut self, row: &Row, unit: Identifier) -> Result<()> {
        let position_name = row.extract(Field::Cargo)?;
        let order = row.extract(Field::CarOrden)?;
        let first = row.extract(Field::AutoridadNombre)?;
        let last = row.extract(Field::AutoridadApellido)?;
        let norms = row.extract(Field::NormaCompetenciasObjetivos)?;

        let mut path = self.path_names(&unit)?;
        path.push(position_segment(position_name, order, norms, last, first));
        let identifier = identifier_for(&path);
        if self.by_identifier.contains_key(&identifier) {
            tracing::warn!(
                "Row {}: position `{}` repeats an earlier row, keeping the first",
                row.number,
                path.join(" / ")
            );
            return Ok(());
        }

        let position = Position {
            id: NodeId(self.nodes.len() as u64),
            name: Position::display_name(position_name, order, last, first),
            identifier,
            snapshot_id: self.snapshot_id,
            position_name: position_name.to_string(),
            position_order: order.to_string(),
            incumbent_first_name: first.to_string(),
            incumbent_last_name: last.to_string(),
            reports_to: row.extract(Field::ReportaA)?.to_string(),
            unit,
        };
        self.insert_node(Node::Position(position), Some(unit));
        Ok(())
    }

    fn insert_node(&mut self, node: Node, parent: Option<Identifier>) {
        let identifier = node.identifier();
        self.by_identifier.insert(identifier, self.nodes.len());
        self.by_name
            .entry(node.name().to_string())
            .or_default()
            .push(identifier);
        self.nodes.push(node);
        self.graph.add_node(identifier);
        if let Some(parent) = parent {
            if self.graph.add_edge(parent, identifier) {
                self.edges.push(Edge {
                    source: parent,
                    target: identifier,
                    snapshot_id: self.snapshot_id,
                });
            }
        }
    }

    fn record_documents(&mut self, row: &Row, unit: Identifier) -> Result<()> {
        for url in document_urls(row.extract(Field::NormaCompetenciasObjetivos)?) {
            if self.seen_documents.insert((unit, url.clone())) {
                self.documents.push(DocumentReference { unit, url });
            }
        }
        Ok(())
    }
}

impl HierarchyView for SnapshotBuilder<'_> {
    fn hierarchy(&self) -> &HierarchyGraph {
        &self.graph
    }

    fn name_of(&self, identifier: &Identifier) -> Option<&str> {
        self.by_identifier
            .get(identifier)
            .map(|&i| self.nodes[i].name())
    }

    fn nodes_named(&self, name: &str) -> Vec<Identifier> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }
}

/// Distinct, non-empty jurisdiction/sub-jurisdiction/political-level/unit
/// values, in column order. A single value marks a jurisdiction row.
pub fn known_path_parts(row: &Row) -> Result<Vec<String>> {
    let mut parts: Vec<String> = Vec::with_capacity(4);
    for field in [
        Field::Jurisdiccion,
        Field::Subjurisdiccion,
        Field::UnidadDeNivelPolitico,
        Field::Unidad,
    ] {
        let value = row.extract(field)?;
        if !value.is_empty() && !parts.iter().any(|p| p == value) {
            parts.push(value.to_string());
        }
    }
    Ok(parts)
}

impl Snapshot {
    /// Build a snapshot from a CSV file on disk.
    pub fn build(path: &Path, central_administration_only: bool, config: &BuildConfig) -> Result<Snapshot> {
        let key = SnapshotKey::new(path.to_string_lossy(), central_administration_only);
        let rows = RowReader::open(path, config.strict_headers)?;
        Self::build_from_rows(rows, key, config)
    }

    /// Build a snapshot from any CSV byte source, recorded under `key`.
    pub fn build_from_reader<R: Read>(source: R, key: SnapshotKey, config: &BuildConfig) -> Result<Snapshot> {
        let rows = RowReader::from_reader(source, config.strict_headers)?;
        Self::build_from_rows(rows, key, config)
    }

    fn build_from_rows(
        rows: impl Iterator<Item = Result<Row>>,
        key: SnapshotKey,
        config: &BuildConfig,
    ) -> Result<Snapshot> {
        tracing::info!(
            "Building snapshot from {} (central administration only: {})",
            key.source_path,
            key.central_administration_only
        );
        let mut builder = SnapshotBuilder::new(config, key);
        for row in rows {
            builder.ingest(&row?)?;
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn ingest_all(builder: &mut SnapshotBuilder<'_>, fixtures: &[FixtureRow]) {
        for (i, fixture) in fixtures.iter().enumerate() {
            builder.ingest(&Row::from_values(i + 1, fixture.cells())).unwrap();
        }
    }

    #[test]
    fn test_known_path_parts_skip_blanks_and_repeats() {
        let row = FixtureRow::new(["M", "M", "", "Dirección"], "M");
        let row = Row::from_values(1, row.cells());
        assert_eq!(known_path_parts(&row).unwrap(), vec!["M", "Dirección"]);
    }

    #[test]
    fn test_finish_rejects_second_parent() {
        let config = BuildConfig::default();
        let mut builder = SnapshotBuilder::new(&config, SnapshotKey::new("fixtures/2023.csv", true));
        ingest_all(&mut builder, &scenario_b());

        let root = builder.root_identifier();
        let shared = identifier_for(&[
            config.root_name.as_str(),
            "M",
            "Secretaría B",
            "Coordinación",
        ]);
        assert!(builder.graph.add_edge(root, shared));

        match builder.finish() {
            Err(OrgTreeError::StructuralIntegrity { identifier, predecessors }) => {
                assert_eq!(identifier, shared);
                assert_eq!(predecessors, 2);
            }
            Err(other) => panic!("expected StructuralIntegrity, got {other:?}"),
            Ok(_) => panic!("expected StructuralIntegrity, got a snapshot"),
        }
    }

    #[test]
    fn test_finish_without_rows_is_empty_input() {
        let config = BuildConfig::default();
        let builder = SnapshotBuilder::new(&config, SnapshotKey::new("fixtures/2023.csv", true));
        assert!(matches!(builder.finish(), Err(OrgTreeError::EmptyInput)));
    }
}
