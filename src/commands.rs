//! CLI command implementations

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use orgtree_core::{BuildConfig, Identifier, Snapshot, SnapshotStore, format_path};
use rayon::prelude::*;

use crate::OutputFormat;

/// Configured store shared by every command of one invocation.
pub struct Session {
    store: SnapshotStore,
}

impl Session {
    pub fn open(root: &Path, config_path: &Path, use_cache: bool) -> anyhow::Result<Self> {
        let config = BuildConfig::load(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;
        tracing::debug!(
            "Root `{}`, {} parent overrides",
            config.root_name,
            config.parent_overrides.len()
        );
        let store = SnapshotStore::new(config);
        let store = if use_cache { store.with_cache(root) } else { store };
        Ok(Session { store })
    }

    fn snapshot(&self, file: &Path, central_only: bool) -> anyhow::Result<Arc<Snapshot>> {
        self.store
            .get_or_build(file, central_only)
            .with_context(|| format!("building snapshot from {}", file.display()))
    }
}

pub fn build(session: &Session, files: &[PathBuf], central_only: bool) -> anyhow::Result<()> {
    tracing::info!("Building {} snapshots", files.len());

    let results: Vec<_> = files
        .par_iter()
        .map(|file| (file, session.snapshot(file, central_only)))
        .collect();

    let mut failures = 0;
    for (file, result) in results {
        match result {
            Ok(snapshot) => println!(
                "{}\t{} units\t{} positions\t{} edges\t{}",
                snapshot.date_label(),
                snapshot.units().count(),
                snapshot.positions().count(),
                snapshot.edge_count(),
                snapshot.id()
            ),
            Err(e) => {
                tracing::error!("{}: {:#}", file.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} snapshots failed to build", failures, files.len());
    }
    Ok(())
}

pub fn jurisdictions(session: &Session, file: &Path, central_only: bool) -> anyhow::Result<()> {
    let snapshot = session.snapshot(file, central_only)?;
    for name in snapshot.jurisdictions() {
        println!("{name}");
    }
    Ok(())
}

pub fn path(session: &Session, file: &Path, target: &str, central_only: bool) -> anyhow::Result<()> {
    let snapshot = session.snapshot(file, central_only)?;
    let identifier = lookup(&snapshot, target)?;
    println!("{}", format_path(&snapshot.path_to(&identifier, None)?));
    Ok(())
}

pub fn descendants(session: &Session, file: &Path, target: &str, central_only: bool) -> anyhow::Result<()> {
    let snapshot = session.snapshot(file, central_only)?;
    let identifier = lookup(&snapshot, target)?;
    let below = snapshot.descendants(&identifier)?;

    // Creation order keeps the listing stable between runs.
    for node in snapshot.nodes().iter().filter(|n| below.contains(&n.identifier())) {
        println!("{}\t{}", node.identifier(), node.name());
    }
    Ok(())
}

pub fn flatten(session: &Session, file: &Path, format: OutputFormat, central_only: bool) -> anyhow::Result<()> {
    let snapshot = session.snapshot(file, central_only)?;
    let rows = snapshot.flatten()?;
    let stdout = io::stdout().lock();

    match format {
        OutputFormat::Json => {
            let mut out = io::BufWriter::new(stdout);
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
            out.flush()?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(stdout);
            writer.write_record(["identifier", "parent", "name", "path"])?;
            for row in &rows {
                writer.write_record([
                    row.identifier.to_string(),
                    row.parent.clone(),
                    row.name.clone(),
                    format_path(&row.path),
                ])?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

pub fn clear(root: &Path) -> anyhow::Result<()> {
    tracing::info!("Clearing cache for: {}", root.display());

    orgtree_core::clear_cache(root)?;

    tracing::info!("Cache cleared");
    Ok(())
}

/// Accept either an identifier or a name path starting at the root.
fn lookup(snapshot: &Snapshot, target: &str) -> anyhow::Result<Identifier> {
    if let Ok(identifier) = target.parse::<Identifier>() {
        return Ok(identifier);
    }
    Ok(snapshot.identifier_at_path(target)?)
}
