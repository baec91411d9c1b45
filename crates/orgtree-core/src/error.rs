//! Error taxonomy for snapshot construction and queries

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Identifier;

/// Every failure the core can surface. Row numbers are 1-based data rows
/// (the header is row 0).
#[derive(Debug, Error)]
pub enum OrgTreeError {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed tabular input at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("schema mismatch at row {row}: {detail}")]
    SchemaMismatch { row: usize, detail: String },

    #[error("row {row} has no value for field `{field}`")]
    MissingField { row: usize, field: &'static str },

    #[error("input has no data rows")]
    EmptyInput,

    #[error("row {row}: unit `{unit}` reports to `{reports_to}`, which is not found in the current jurisdiction")]
    UnresolvableParent {
        row: usize,
        unit: String,
        reports_to: String,
    },

    #[error("node {identifier} is not reachable")]
    NotFound { identifier: Identifier },

    #[error("no node at path `{path}`")]
    PathNotFound { path: String },

    #[error("node {identifier} has {predecessors} predecessors")]
    StructuralIntegrity {
        identifier: Identifier,
        predecessors: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("snapshot cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, OrgTreeError>;

impl From<toml::de::Error> for OrgTreeError {
    fn from(err: toml::de::Error) -> Self {
        OrgTreeError::Config(err.to_string())
    }
}

impl From<bincode::Error> for OrgTreeError {
    fn from(err: bincode::Error) -> Self {
        OrgTreeError::Cache(err.to_string())
    }
}
