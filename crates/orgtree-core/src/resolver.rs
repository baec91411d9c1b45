//! Disambiguation of parent references made by display name

use crate::graph::HierarchyView;
use crate::model::Identifier;

/// How a parent was picked among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Only one node in scope carries the name.
    Unique,
    /// Exactly one candidate's path matches the row's known path parts.
    ExactPath,
    /// Highest overlap between candidate path and known path parts.
    /// `tied` counts the other candidates with the same score.
    BestOverlap { score: usize, tied: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub identifier: Identifier,
    pub resolution: Resolution,
}

/// Resolves names against the descendants of one jurisdiction (inclusive).
pub struct ParentResolver<'v, V: HierarchyView> {
    view: &'v V,
    scope: Identifier,
}

impl<'v, V: HierarchyView> ParentResolver<'v, V> {
    pub fn new(view: &'v V, scope: Identifier) -> Self {
        ParentResolver { view, scope }
    }

    /// Nodes in scope named `name`, in discovery order (pre-order from the
    /// scope root, children in insertion order).
    pub fn candidates(&self, name: &str) -> Vec<Identifier> {
        let graph = self.view.hierarchy();
        let mut found: Vec<(Vec<usize>, Identifier)> = self
            .view
            .nodes_named(name)
            .into_iter()
            .filter_map(|id| graph.preorder_key(&id, &self.scope).map(|key| (key, id)))
            .collect();
        found.sort();
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Pick the node `declared_parent` refers to. `expected_path` is the
    /// row's known path parts with the row's own unit name removed.
    ///
    /// Returns `None` when no node in scope has that name.
    ///
    /// Ties on overlap go to the first candidate discovered. Nothing in the
    /// data makes that candidate more likely to be right; it only makes the
    /// outcome reproducible.
    pub fn resolve(&self, declared_parent: &str, expected_path: &[String]) -> Option<Resolved> {
        let candidates = self.candidates(declared_parent);
        match candidates.as_slice() {
            [] => None,
            [only] => Some(Resolved {
                identifier: *only,
                resolution: Resolution::Unique,
            }),
            _ => Some(self.disambiguate(&candidates, expected_path)),
        }
    }

    fn disambiguate(&self, candidates: &[Identifier], expected_path: &[String]) -> Resolved {
        let paths: Vec<(Identifier, Vec<String>)> = candidates
            .iter()
            .map(|id| (*id, self.view.name_path(id, &self.scope).unwrap_or_default()))
            .collect();

        let exact: Vec<Identifier> = paths
            .iter()
            .filter(|(_, path)| path.as_slice() == expected_path)
            .map(|(id, _)| *id)
            .collect();
        if let [only] = exact.as_slice() {
            return Resolved {
                identifier: *only,
                resolution: Resolution::ExactPath,
            };
        }

        let scores: Vec<usize> = paths
            .iter()
            .map(|(_, path)| expected_path.iter().filter(|part| path.contains(part)).count())
            .collect();
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }
        let tied = scores.iter().filter(|s| **s == scores[best]).count() - 1;
        Resolved {
            identifier: paths[best].0,
            resolution: Resolution::BestOverlap {
                score: scores[best],
                tied,
            },
        }
    }
}
