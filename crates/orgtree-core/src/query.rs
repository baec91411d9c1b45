//! Read-side queries over a committed snapshot

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OrgTreeError, Result};
use crate::graph::HierarchyView;
use crate::identity::{format_path, PATH_SEPARATOR};
use crate::model::*;
use crate::snapshot::Snapshot;

/// One node in the flat tabular form consumed by visualizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub identifier: Identifier,
    /// Empty for the root.
    pub parent: String,
    pub name: String,
    pub path: Vec<String>,
}

/// Selects units by class, rank and jurisdiction membership.
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    classes: Option<Vec<UnitClass>>,
    ranges: Option<Vec<String>>,
    excluded_names: Vec<String>,
    within: Vec<String>,
}

impl UnitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only units of these classes.
    #[must_use]
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = UnitClass>) -> Self {
        self.classes = Some(classes.into_iter().collect());
        self
    }

    /// Keep only units whose rank label is one of these.
    #[must_use]
    pub fn with_ranges<S: Into<String>>(mut self, ranges: impl IntoIterator<Item = S>) -> Self {
        self.ranges = Some(ranges.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn excluding<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.excluded_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Keep only units with one of these names somewhere on their root path.
    #[must_use]
    pub fn within<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.within.extend(names.into_iter().map(Into::into));
        self
    }

    fn accepts(&self, unit: &Unit, path: &[String]) -> bool {
        if self.excluded_names.contains(&unit.name) {
            return false;
        }
        if let Some(classes) = &self.classes {
            if !classes.contains(&unit.unit_class) {
                return false;
            }
        }
        if let Some(ranges) = &self.ranges {
            if !ranges.contains(&unit.range) {
                return false;
            }
        }
        self.within.is_empty() || path.iter().any(|part| self.within.contains(part))
    }
}

impl Snapshot {
    /// Identifiers from `from` (default: the root) down to `target`.
    pub fn identifier_path_to(
        &self,
        target: &Identifier,
        from: Option<&Identifier>,
    ) -> Result<Vec<Identifier>> {
        let from = from.copied().unwrap_or(self.root_identifier());
        self.graph()
            .path_between(target, &from)
            .ok_or(OrgTreeError::NotFound {
                identifier: *target,
            })
    }

    /// Display names from `from` (default: the root) down to `target`.
    pub fn path_to(&self, target: &Identifier, from: Option<&Identifier>) -> Result<Vec<String>> {
        let from = from.copied().unwrap_or(self.root_identifier());
        self.name_path(target, &from).ok_or(OrgTreeError::NotFound {
            identifier: *target,
        })
    }

    /// `identifier` and everything below it.
    pub fn descendants(&self, identifier: &Identifier) -> Result<HashSet<Identifier>> {
        if self.node(identifier).is_none() {
            return Err(OrgTreeError::NotFound {
                identifier: *identifier,
            });
        }
        Ok(self.graph().descendants(identifier))
    }

    pub fn root_name(&self) -> &str {
        self.name_of(&self.root_identifier()).unwrap_or_default()
    }

    /// Units directly under the root, in insertion order.
    pub fn jurisdiction_identifiers(&self) -> Vec<Identifier> {
        self.graph()
            .children(&self.root_identifier())
            .into_iter()
            .filter(|id| self.unit(id).is_some())
            .collect()
    }

    /// The root name followed by every jurisdiction name.
    pub fn jurisdictions(&self) -> Vec<String> {
        std::iter::once(self.root_name().to_string())
            .chain(
                self.jurisdiction_identifiers()
                    .into_iter()
                    .filter_map(|id| self.name_of(&id).map(str::to_string)),
            )
            .collect()
    }

    /// One row per node, in creation order.
    pub fn flatten(&self) -> Result<Vec<FlatRow>> {
        let graph = self.graph();
        self.nodes()
            .iter()
            .map(|node| {
                let identifier = node.identifier();
                let predecessors = graph.predecessors(&identifier);
                if predecessors.len() > 1 {
                    return Err(OrgTreeError::StructuralIntegrity {
                        identifier,
                        predecessors: predecessors.len(),
                    });
                }
                Ok(FlatRow {
                    identifier,
                    parent: predecessors
                        .first()
                        .map(Identifier::to_string)
                        .unwrap_or_default(),
                    name: node.name().to_string(),
                    path: self.path_to(&identifier, None)?,
                })
            })
            .collect()
    }

    /// Resolve a name path that starts at the root. Among same-named
    /// siblings the first inserted wins.
    pub fn identifier_at<S: AsRef<str>>(&self, path: &[S]) -> Result<Identifier> {
        let not_found = || OrgTreeError::PathNotFound {
            path: format_path(path),
        };
        let (first, rest) = path.split_first().ok_or_else(not_found)?;
        if first.as_ref() != self.root_name() {
            return Err(not_found());
        }
        let mut current = self.root_identifier();
        for part in rest {
            current = self
                .graph()
                .children(&current)
                .into_iter()
                .find(|child| self.name_of(child) == Some(part.as_ref()))
                .ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// [`Snapshot::identifier_at`] over a `" -> "`-joined path.
    pub fn identifier_at_path(&self, path: &str) -> Result<Identifier> {
        let parts: Vec<&str> = path.split(PATH_SEPARATOR).map(str::trim).collect();
        self.identifier_at(&parts)
    }

    pub fn positions_of(&self, unit: &Identifier) -> Vec<&Position> {
        self.graph()
            .children(unit)
            .into_iter()
            .filter_map(|id| self.position(&id))
            .collect()
    }

    /// Number of edges between the root and `identifier`.
    pub fn depth(&self, identifier: &Identifier) -> Result<usize> {
        Ok(self.identifier_path_to(identifier, None)?.len() - 1)
    }

    /// Deepest node that is an ancestor of both (a node counts as its own ancestor).
    pub fn lowest_common_ancestor(&self, a: &Identifier, b: &Identifier) -> Result<Identifier> {
        let above_a: HashSet<Identifier> = self.identifier_path_to(a, None)?.into_iter().collect();
        self.identifier_path_to(b, None)?
            .into_iter()
            .rev()
            .find(|id| above_a.contains(id))
            .ok_or(OrgTreeError::NotFound { identifier: *b })
    }

    /// Units accepted by `filter`, in creation order.
    pub fn units_matching(&self, filter: &UnitFilter) -> Vec<&Unit> {
        self.units()
            .filter(|unit| {
                let path = self.path_to(&unit.identifier, None).unwrap_or_default();
                filter.accepts(unit, &path)
            })
            .collect()
    }
}
