//! Orgtree Core — snapshot graph model, identity, construction and queries

pub mod error;
pub mod model;
pub mod identity;
pub mod fields;
pub mod graph;
pub mod resolver;
pub mod builder;
pub mod snapshot;
pub mod query;
pub mod config;
pub mod documents;
pub mod comparison;
pub mod store;
pub mod cache;


#[cfg(test)]
pub mod test_utils;

pub use error::{OrgTreeError, Result};
pub use model::{Identifier, SnapshotId, NodeId, NodeKind, Node, Unit, Position, Edge, UnitClass, AdministrationType, DocumentReference};
pub use identity::{identifier_for, format_path, position_segment, PATH_SEPARATOR};
pub use fields::{Field, Row, RowReader};
pub use graph::{HierarchyGraph, HierarchyView};
pub use resolver::{ParentResolver, Resolution, Resolved};
pub use builder::{BuildState, SnapshotBuilder, known_path_parts};
pub use snapshot::{Snapshot, SnapshotKey};
pub use query::{FlatRow, UnitFilter};
pub use config::{BuildConfig, ParentOverride};
pub use comparison::{ComparisonRecord, UnitStatus};
pub use store::SnapshotStore;
pub use cache::{CACHE_DIR, cache_dir, source_fingerprint, snapshot_cache_path, ensure_cache_dir, save_snapshot, load_snapshot, clear_cache};
