//! Idempotent load-or-create of snapshots

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::cache;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::snapshot::{Snapshot, SnapshotKey};

/// Committed snapshots by key. Thread-safe; distinct keys build
/// independently, and a key is built at most once.
///
/// `snapshots` only ever holds committed results, and its shard locks are
/// held for single map operations. Builds serialize on a per-key lock in
/// `building`, so readers and builds of other keys never wait on a build.
pub struct SnapshotStore {
    config: BuildConfig,
    cache_root: Option<PathBuf>,
    snapshots: DashMap<SnapshotKey, Arc<Snapshot>>,
    building: DashMap<SnapshotKey, Arc<Mutex<()>>>,
}

impl SnapshotStore {
    pub fn new(config: BuildConfig) -> Self {
        SnapshotStore {
            config,
            cache_root: None,
            snapshots: DashMap::new(),
            building: DashMap::new(),
        }
    }

    /// Also persist committed snapshots under `root/.orgtree/` and reuse them
    /// across processes.
    pub fn with_cache(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Return the snapshot for `(source_path, central_administration_only)`,
    /// building it on first request. A failed build leaves nothing behind,
    /// so a retry starts clean.
    pub fn get_or_build(&self, source_path: &Path, central_administration_only: bool) -> Result<Arc<Snapshot>> {
        let key = SnapshotKey::new(source_path.to_string_lossy(), central_administration_only);
        if let Some(existing) = self.get(&key) {
            tracing::debug!("Snapshot {} already built", key.source_path);
            return Ok(existing);
        }

        let lock = self.build_lock(&key);
        let _building = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have committed while we waited for the lock.
        if let Some(existing) = self.get(&key) {
            return Ok(existing);
        }

        let snapshot = Arc::new(self.load_or_build(source_path, &key)?);
        Ok(Arc::clone(
            self.snapshots.entry(key).or_insert(snapshot).value(),
        ))
    }

    /// The per-key build lock. The map guard is released before returning.
    fn build_lock(&self, key: &SnapshotKey) -> Arc<Mutex<()>> {
        Arc::clone(self.building.entry(key.clone()).or_default().value())
    }

    fn load_or_build(&self, source_path: &Path, key: &SnapshotKey) -> Result<Snapshot> {
        let cached = match &self.cache_root {
            Some(root) => Some((root, cache::source_fingerprint(&self.config, source_path)?)),
            None => None,
        };

        if let Some((root, fingerprint)) = &cached {
            match cache::load_snapshot(root, key, fingerprint) {
                Ok(Some(snapshot)) => return Ok(snapshot),
                Ok(None) => {}
                Err(e) => tracing::warn!("Discarding unreadable snapshot cache: {}", e),
            }
        }

        let snapshot = Snapshot::build(source_path, key.central_administration_only, &self.config)?;

        if let Some((root, fingerprint)) = &cached {
            if let Err(e) = cache::save_snapshot(&snapshot, root, fingerprint) {
                tracing::warn!("Cannot cache snapshot {}: {}", key.source_path, e);
            }
        }
        Ok(snapshot)
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<Arc<Snapshot>> {
        self.snapshots.get(key).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, key: &SnapshotKey) -> bool {
        self.snapshots.contains_key(key)
    }

    /// Drop a snapshot from memory. Holders of the `Arc` keep their copy.
    pub fn evict(&self, key: &SnapshotKey) -> Option<Arc<Snapshot>> {
        self.snapshots.remove(key).map(|(_, snapshot)| snapshot)
    }

    /// Number of committed snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_build_in_progress_does_not_block_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let committed = write_csv(dir.path(), "2021.csv", &scenario_a());
        let busy = write_csv(dir.path(), "2023.csv", &scenario_a());
        let other = write_csv(dir.path(), "2025.csv", &scenario_b());
        let store = SnapshotStore::default();
        let first = store.get_or_build(&committed, true).unwrap();

        // Hold the build lock of one key, as a long build would.
        let busy_key = SnapshotKey::new(busy.to_string_lossy(), true);
        let lock = store.build_lock(&busy_key);
        let held = lock.lock().unwrap();

        std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let (store, committed_key, other) = (&store, first.key().clone(), other.as_path());
            scope.spawn(move || {
                let reader = store.get(&committed_key).map(|s| s.id());
                let len = store.len();
                let built = store.get_or_build(other, true).map(|s| s.id());
                tx.send((reader, len, built)).unwrap();
            });

            let (reader, len, built) = rx.recv_timeout(Duration::from_secs(30)).unwrap();
            assert_eq!(reader, Some(first.id()));
            assert_eq!(len, 1);
            assert!(built.is_ok());
        });

        assert!(!store.contains(&busy_key));
        drop(held);
        assert!(store.get_or_build(&busy, true).is_ok());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_failed_build_keeps_lock_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("2023.csv");
        let store = SnapshotStore::default();

        assert!(store.get_or_build(&missing, true).is_err());
        assert!(store.is_empty());

        write_csv(dir.path(), "2023.csv", &scenario_a());
        assert_eq!(store.get_or_build(&missing, true).unwrap().units().count(), 3);
    }
}
