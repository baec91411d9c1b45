//! Build configuration, loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OrgTreeError, Result};

pub const DEFAULT_ROOT_NAME: &str = "Presidencia de la Nación";
pub const DEFAULT_CENTRAL_ADMINISTRATION: &str = "Administración Central";

/// Settings that shape how a snapshot is built. Passed explicitly into the
/// builder; nothing here is read from the process environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Name of the root node. Its identifier is the hash of this name alone.
    pub root_name: String,
    /// `tipo_administracion` value kept when building a central-only snapshot.
    pub central_administration_value: String,
    /// Require header labels to match the schema, not only the column count.
    pub strict_headers: bool,
    pub parent_overrides: Vec<ParentOverride>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            central_administration_value: DEFAULT_CENTRAL_ADMINISTRATION.to_string(),
            strict_headers: true,
            parent_overrides: Vec::new(),
        }
    }
}

/// Forced parent for a unit whose declared parent cannot be located.
///
/// ```toml
/// [[parent_overrides]]
/// snapshot = "2023"
/// unit = "Dirección de Vinculación"
/// parent = "Consejo Asesor del Sector Privado"
/// create_under = "Instituto Nacional de Tecnología Agropecuaria"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentOverride {
    /// Snapshot date label this applies to; `None` applies to every snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    /// Unit name of the affected row.
    pub unit: String,
    /// Parent name used instead of the row's `reporta_a`.
    pub parent: String,
    /// When `parent` is absent from the jurisdiction, create it under this unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_under: Option<String>,
}

impl ParentOverride {
    pub fn applies_to(&self, snapshot_label: &str, unit: &str) -> bool {
        self.unit == unit
            && self
                .snapshot
                .as_deref()
                .is_none_or(|label| label == snapshot_label)
    }
}

impl BuildConfig {
    /// Read a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(BuildConfig::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| OrgTreeError::Config(e.to_string()))
    }

    /// First override matching the snapshot and unit.
    pub fn override_for(&self, snapshot_label: &str, unit: &str) -> Option<&ParentOverride> {
        self.parent_overrides
            .iter()
            .find(|o| o.applies_to(snapshot_label, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.root_name, "Presidencia de la Nación");
        assert_eq!(config.central_administration_value, "Administración Central");
        assert!(config.strict_headers);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BuildConfig::from_toml(
            r#"
strict_headers = false

[[parent_overrides]]
snapshot = "2023"
unit = "Unidad A"
parent = "Consejo"
create_under = "Instituto"

[[parent_overrides]]
unit = "Unidad B"
parent = "Secretaría"
"#,
        )
        .unwrap();

        assert!(!config.strict_headers);
        assert_eq!(config.root_name, DEFAULT_ROOT_NAME);
        assert_eq!(config.parent_overrides.len(), 2);

        assert!(config.override_for("2023", "Unidad A").is_some());
        assert!(config.override_for("2025", "Unidad A").is_none());
        assert_eq!(config.override_for("2025", "Unidad B").unwrap().parent, "Secretaría");
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let result = BuildConfig::from_toml("parent_overrides = 3");
        assert!(matches!(result, Err(crate::OrgTreeError::Config(_))));
    }

    #[test]
    fn test_toml_output_reloads() {
        let mut config = BuildConfig::default();
        config.parent_overrides.push(ParentOverride {
            snapshot: None,
            unit: "Unidad B".to_string(),
            parent: "Secretaría".to_string(),
            create_under: None,
        });
        let raw = config.to_toml().unwrap();
        assert!(!raw.contains("create_under"));
        assert_eq!(BuildConfig::from_toml(&raw).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load(&dir.path().join("orgtree.toml")).unwrap();
        assert_eq!(config, BuildConfig::default());
    }
}
