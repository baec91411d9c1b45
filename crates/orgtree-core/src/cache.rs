//! On-disk cache of committed snapshots

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use uuid::Uuid;

use crate::config::BuildConfig;
use crate::error::{OrgTreeError, Result};
use crate::snapshot::{Snapshot, SnapshotKey};

/// Cache directory: .orgtree/
pub const CACHE_DIR: &str = ".orgtree";

/// Get cache directory path
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

/// Digest of everything besides the key that shapes a build: the build
/// configuration and the source file's length and modification time.
/// Editing either one moves the snapshot to a different cache file.
pub fn source_fingerprint(config: &BuildConfig, source: &Path) -> Result<String> {
    let metadata = fs::metadata(source).map_err(|e| match e.kind() {
        ErrorKind::NotFound => OrgTreeError::InputNotFound {
            path: source.to_path_buf(),
        },
        _ => OrgTreeError::Io(e),
    })?;
    let modified = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let material = format!("{}\n{}\n{}", config.to_toml()?, metadata.len(), modified);
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_URL, material.as_bytes())
        .simple()
        .to_string())
}

/// `<snapshot id>-<fingerprint>.bin`
pub fn snapshot_cache_path(root: &Path, key: &SnapshotKey, fingerprint: &str) -> PathBuf {
    cache_dir(root).join(format!("{}-{}.bin", key.snapshot_id(), fingerprint))
}

/// Ensure cache directory exists
pub fn ensure_cache_dir(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if !cache.exists() {
        fs::create_dir_all(&cache)?;
    }
    Ok(())
}

/// Write a committed snapshot. The file is written next to its final name
/// and renamed into place, so readers never see a partial file. Entries for
/// the same key under older fingerprints are removed.
pub fn save_snapshot(snapshot: &Snapshot, root: &Path, fingerprint: &str) -> Result<()> {
    ensure_cache_dir(root)?;
    let path = snapshot_cache_path(root, snapshot.key(), fingerprint);
    let staging = path.with_extension("bin.tmp");

    let bytes = bincode::serialize(snapshot)?;
    fs::write(&staging, bytes)?;
    fs::rename(&staging, &path)?;

    let prefix = format!("{}-", snapshot.id());
    for entry in fs::read_dir(cache_dir(root))? {
        let stale = entry?.path();
        let is_stale = stale != path
            && stale
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(&prefix));
        if is_stale {
            tracing::debug!("Removing stale snapshot cache: {}", stale.display());
            fs::remove_file(&stale)?;
        }
    }

    tracing::debug!("Snapshot cache saved: {}", path.display());
    Ok(())
}

/// Load the cached snapshot for `key` built under `fingerprint`, if any.
pub fn load_snapshot(root: &Path, key: &SnapshotKey, fingerprint: &str) -> Result<Option<Snapshot>> {
    let path = snapshot_cache_path(root, key, fingerprint);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&path)?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)?;
    if snapshot.key() != key {
        tracing::warn!("Ignoring cache file {} written for another key", path.display());
        return Ok(None);
    }

    tracing::debug!("Snapshot cache loaded from: {}", path.display());
    Ok(Some(snapshot))
}

/// Clear cache directory
pub fn clear_cache(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if cache.exists() {
        fs::remove_dir_all(&cache)?;
    }
    Ok(())
}
