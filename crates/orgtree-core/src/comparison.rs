//! Records describing how a unit fares between two snapshots

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::format_path;
use crate::model::Identifier;
use crate::snapshot::Snapshot;

/// Outcome of matching one unit across an older and a newer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    #[serde(rename = "igual")]
    Equal,
    #[serde(rename = "movido")]
    Moved,
    #[serde(rename = "renombrado")]
    Renamed,
    #[serde(rename = "eliminado")]
    Deleted,
    #[serde(rename = "nuevo")]
    New,
}

/// One row of a cross-snapshot comparison. The matching itself happens
/// elsewhere; identifiers are the join key and paths are for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub unit_name: String,
    pub status: UnitStatus,
    pub left_identifier: Option<Identifier>,
    pub right_identifier: Option<Identifier>,
    pub left_path: Option<String>,
    pub right_path: Option<String>,
}

impl ComparisonRecord {
    pub fn new(unit_name: impl Into<String>, status: UnitStatus) -> Self {
        ComparisonRecord {
            unit_name: unit_name.into(),
            status,
            left_identifier: None,
            right_identifier: None,
            left_path: None,
            right_path: None,
        }
    }

    /// Attach the unit as found in the older snapshot.
    pub fn with_left(mut self, snapshot: &Snapshot, identifier: Identifier) -> Result<Self> {
        self.left_path = Some(format_path(&snapshot.path_to(&identifier, None)?));
        self.left_identifier = Some(identifier);
        Ok(self)
    }

    /// Attach the unit as found in the newer snapshot.
    pub fn with_right(mut self, snapshot: &Snapshot, identifier: Identifier) -> Result<Self> {
        self.right_path = Some(format_path(&snapshot.path_to(&identifier, None)?));
        self.right_identifier = Some(identifier);
        Ok(self)
    }

    /// Both sides carry the same identifier, i.e. the same path.
    pub fn same_identity(&self) -> bool {
        self.left_identifier.is_some() && self.left_identifier == self.right_identifier
    }
}
