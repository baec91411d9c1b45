//! Integration tests for Orgtree
//!
//! These tests drive the built binary and the core store together.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use orgtree_core::{Field, SnapshotStore, identifier_for};
use tempfile::TempDir;

const ROOT: &str = "Presidencia de la Nación";

/// (jurisdiccion, subjurisdiccion, unidad, reporta_a, tipo_administracion)
type Line<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

const CENTRAL: &str = "Administración Central";

fn structure() -> Vec<Line<'static>> {
    vec![
        (ROOT, ROOT, ROOT, "", CENTRAL),
        ("Ministerio de Economía", "Ministerio de Economía", "Ministerio de Economía", ROOT, CENTRAL),
        ("Ministerio de Economía", "Secretaría de Hacienda", "Secretaría de Hacienda", "Ministerio de Economía", CENTRAL),
        ("Ministerio de Economía", "Secretaría de Hacienda", "Oficina de Presupuesto", "Secretaría de Hacienda", CENTRAL),
        ("Ministerio de Salud", "Ministerio de Salud", "Ministerio de Salud", ROOT, CENTRAL),
        ("Ministerio de Salud", "Hospital Nacional", "Hospital Nacional", "Ministerio de Salud", "Organismo Descentralizado"),
    ]
}

fn write_structure(dir: &Path, file_name: &str, lines: &[Line]) -> PathBuf {
    let path = dir.join(file_name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer
        .write_record(Field::ALL.iter().map(|f| f.header()))
        .unwrap();
    for (jurisdiction, sub, unit, reports_to, kind) in lines {
        let mut cells = vec![String::new(); Field::COUNT];
        cells[Field::Jurisdiccion.index()] = jurisdiction.to_string();
        cells[Field::Subjurisdiccion.index()] = sub.to_string();
        cells[Field::Unidad.index()] = unit.to_string();
        cells[Field::ReportaA.index()] = reports_to.to_string();
        cells[Field::TipoAdministracion.index()] = kind.to_string();
        cells[Field::UnidadClase.index()] = "Sustantiva".to_string();
        cells[Field::CarOrden.index()] = "1".to_string();
        cells[Field::Cargo.index()] = "Titular".to_string();
        writer.write_record(&cells).unwrap();
    }
    writer.flush().unwrap();
    path
}

fn orgtree(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_orgtree"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute orgtree")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let output = orgtree(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("organization-structure snapshots"));
}

#[test]
fn test_cli_jurisdictions_respect_filter() {
    let dir = TempDir::new().unwrap();
    let mut lines = structure();
    lines.push(("Ente Regulador", "Ente Regulador", "Ente Regulador", ROOT, "Organismo Descentralizado"));
    let file = write_structure(dir.path(), "2023.csv", &lines);
    let file = file.to_str().unwrap();

    let central = orgtree(dir.path(), &["--no-cache", "jurisdictions", file]);
    assert!(central.status.success());
    assert_eq!(
        stdout_lines(&central),
        vec![ROOT, "Ministerio de Economía", "Ministerio de Salud"]
    );

    let all = orgtree(dir.path(), &["--no-cache", "--all", "jurisdictions", file]);
    assert!(all.status.success());
    assert_eq!(
        stdout_lines(&all),
        vec![ROOT, "Ministerio de Economía", "Ministerio de Salud", "Ente Regulador"]
    );
}

#[test]
fn test_cli_path_by_name_and_identifier() {
    let dir = TempDir::new().unwrap();
    let file = write_structure(dir.path(), "2023.csv", &structure());
    let file = file.to_str().unwrap();
    let by_name = format!(
        "{ROOT} -> Ministerio de Economía -> Secretaría de Hacienda -> Oficina de Presupuesto"
    );

    let output = orgtree(dir.path(), &["--no-cache", "path", file, &by_name]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec![by_name.clone()]);

    let identifier = identifier_for(&[
        ROOT,
        "Ministerio de Economía",
        "Secretaría de Hacienda",
        "Oficina de Presupuesto",
    ])
    .to_string();
    let output = orgtree(dir.path(), &["--no-cache", "path", file, &identifier]);
    assert_eq!(stdout_lines(&output), vec![by_name]);
}

#[test]
fn test_cli_descendants_include_positions() {
    let dir = TempDir::new().unwrap();
    let file = write_structure(dir.path(), "2023.csv", &structure());
    let file = file.to_str().unwrap();
    let target = format!("{ROOT} -> Ministerio de Economía -> Secretaría de Hacienda");

    let output = orgtree(dir.path(), &["--no-cache", "descendants", file, &target]);
    assert!(output.status.success());
    let names: Vec<String> = stdout_lines(&output)
        .iter()
        .filter_map(|line| line.split('\t').nth(1).map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec!["Secretaría de Hacienda", "Titular (1)", "Oficina de Presupuesto", "Titular (1)"]
    );
}

#[test]
fn test_cli_flatten_json_covers_all_administrations() {
    let dir = TempDir::new().unwrap();
    let file = write_structure(dir.path(), "2023.csv", &structure());
    let file = file.to_str().unwrap();

    let output = orgtree(dir.path(), &["--no-cache", "--all", "flatten", file, "--format", "json"]);
    assert!(output.status.success());
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    // Six units, one position each.
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0]["parent"], "");
    assert!(
        rows.iter()
            .any(|r| r["name"] == "Hospital Nacional"
                && r["path"][2] == "Hospital Nacional")
    );
}

#[test]
fn test_cli_build_writes_and_clears_cache() {
    let dir = TempDir::new().unwrap();
    let older = write_structure(dir.path(), "2023.csv", &structure());
    let newer = write_structure(dir.path(), "2025.csv", &structure()[..4]);

    let output = orgtree(
        dir.path(),
        &["build", older.to_str().unwrap(), newer.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output).len(), 2);
    let cached = std::fs::read_dir(dir.path().join(".orgtree")).unwrap().count();
    assert_eq!(cached, 2);

    let output = orgtree(dir.path(), &["clear"]);
    assert!(output.status.success());
    assert!(!dir.path().join(".orgtree").exists());
}

#[test]
fn test_cli_build_fails_on_unresolvable_parent() {
    let dir = TempDir::new().unwrap();
    let mut lines = structure();
    lines.push(("Ministerio de Salud", "Ministerio de Salud", "Dirección Suelta", "Nadie", CENTRAL));
    let file = write_structure(dir.path(), "2023.csv", &lines);

    let output = orgtree(dir.path(), &["--no-cache", "build", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nadie"));
}

#[test]
fn test_store_joins_snapshots_by_identifier() {
    let dir = TempDir::new().unwrap();
    let older = write_structure(dir.path(), "2023.csv", &structure());
    let newer = write_structure(dir.path(), "2025.csv", &structure()[..4]);
    let store = SnapshotStore::default();

    let a = store.get_or_build(&older, true).unwrap();
    let b = store.get_or_build(&newer, true).unwrap();
    assert_ne!(a.id(), b.id());

    let office = identifier_for(&[
        ROOT,
        "Ministerio de Economía",
        "Secretaría de Hacienda",
        "Oficina de Presupuesto",
    ]);
    assert_eq!(a.path_to(&office, None).unwrap(), b.path_to(&office, None).unwrap());

    let health = identifier_for(&[ROOT, "Ministerio de Salud"]);
    assert!(a.unit(&health).is_some());
    assert!(b.unit(&health).is_none());
}
