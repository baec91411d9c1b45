//! Test utilities for Orgtree

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::DEFAULT_ROOT_NAME;
use crate::fields::Field;

/// A data row with sensible defaults for every column.
#[derive(Debug, Clone)]
pub struct FixtureRow {
    cells: Vec<String>,
}

impl FixtureRow {
    /// `path` is (jurisdiccion, subjurisdiccion, unidad_de_nivel_politico, unidad).
    pub fn new(path: [&str; 4], reports_to: &str) -> Self {
        FixtureRow {
            cells: vec![String::new(); Field::COUNT],
        }
        .set(Field::Jurisdiccion, path[0])
        .set(Field::Subjurisdiccion, path[1])
        .set(Field::UnidadDeNivelPolitico, path[2])
        .set(Field::Unidad, path[3])
        .set(Field::ReportaA, reports_to)
        .set(Field::TipoAdministracion, "Administración Central")
        .set(Field::UnidadRango, "Dirección")
        .set(Field::UnidadClase, "Sustantiva")
        .set(Field::CarOrden, "1")
        .set(Field::Cargo, "Titular")
        .set(Field::AutoridadNombre, "Ana")
        .set(Field::AutoridadApellido, "Pérez")
    }

    pub fn set(mut self, field: Field, value: &str) -> Self {
        self.cells[field.index()] = value.to_string();
        self
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

pub fn root_row() -> FixtureRow {
    FixtureRow::new([DEFAULT_ROOT_NAME; 4], "").set(Field::UnidadRango, "Presidencia")
}

/// A row whose four path columns all name the jurisdiction.
pub fn jurisdiction_row(name: &str) -> FixtureRow {
    FixtureRow::new([name; 4], DEFAULT_ROOT_NAME).set(Field::UnidadRango, "Ministerio")
}

/// Header plus rows, CSV-quoted.
pub fn csv_text(rows: &[FixtureRow]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(Field::ALL.iter().map(|f| f.header()))
        .unwrap();
    for row in rows {
        writer.write_record(row.cells()).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

pub fn write_csv(dir: &Path, file_name: &str, rows: &[FixtureRow]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, csv_text(rows)).unwrap();
    path
}

/// root; "Ministry X"; "Directorate Y" reporting to "Ministry X".
pub fn scenario_a() -> Vec<FixtureRow> {
    vec![
        root_row(),
        jurisdiction_row("Ministry X"),
        FixtureRow::new(["Ministry X", "Ministry X", "", "Directorate Y"], "Ministry X"),
    ]
}

/// Two "Coordinación" units under different secretariats, then a row whose
/// known path points at the second one.
pub fn scenario_b() -> Vec<FixtureRow> {
    vec![
        root_row(),
        jurisdiction_row("M"),
        FixtureRow::new(["M", "Secretaría A", "", "Secretaría A"], "M"),
        FixtureRow::new(["M", "Secretaría A", "", "Coordinación"], "Secretaría A"),
        FixtureRow::new(["M", "Secretaría B", "", "Secretaría B"], "M"),
        FixtureRow::new(["M", "Secretaría B", "", "Coordinación"], "Secretaría B"),
        FixtureRow::new(["M", "Secretaría B", "Coordinación", "Área de Datos"], "Coordinación"),
    ]
}

/// Write `rows` as `<date>.csv` in a fresh temporary directory.
pub fn create_snapshot_file(date: &str, rows: &[FixtureRow]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = write_csv(temp_dir.path(), &format!("{date}.csv"), rows);
    (temp_dir, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_text_has_schema_header() {
        let text = csv_text(&scenario_a());
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("jurisdiccion,subjurisdiccion,"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_create_snapshot_file() {
        let (_dir, path) = create_snapshot_file("2023", &scenario_a());
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "2023.csv");
    }
}
