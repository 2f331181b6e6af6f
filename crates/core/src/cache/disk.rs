//! Flat on-disk blob store.
//!
//! One file per key directly under a root directory. Writes land in a
//! uniquely named temporary file next to the target and are renamed into
//! place, so a reader sees either the old file or the new one, never a mix.
//! Temporary names are unique per process, across every store instance.

use super::key::KeyStrategy;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

const TMP_PREFIX: &str = ".loupe-";
const TMP_SUFFIX: &str = ".tmp";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors from disk store operations.
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("no cached file at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadFailure { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailure { path: PathBuf, source: io::Error },
}

/// Disk tier of the cache.
///
/// Stateless apart from diagnostic counters; the root is supplied per call so
/// a single store serves every storage location.
#[derive(Debug, Default)]
pub struct DiskStore {
    strategy: KeyStrategy,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl DiskStore {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy, ..Default::default() }
    }

    /// Path that `key` is stored at under `root`.
    pub fn path_for(&self, root: &Path, key: &str) -> PathBuf {
        root.join(self.strategy.filename(key))
    }

    /// Write `bytes` for `key`, replacing any existing file.
    ///
    /// `root` must already exist; no directories are created.
    pub async fn write(&self, root: &Path, key: &str, bytes: &[u8]) -> Result<(), DiskError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let path = self.path_for(root, key);
        let tmp = root.join(format!(
            "{TMP_PREFIX}{}-{}{TMP_SUFFIX}",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(source) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DiskError::WriteFailure { path, source });
        }

        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DiskError::WriteFailure { path, source });
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote cache file");
        Ok(())
    }

    /// Read the file stored for `key`.
    pub async fn read(&self, root: &Path, key: &str) -> Result<Bytes, DiskError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let path = self.path_for(root, key);

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DiskError::NotFound { path }),
            Err(source) => Err(DiskError::ReadFailure { path, source }),
        }
    }

    /// Number of `read` calls made.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write` calls made.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

/// Remove temporary files under `root` last modified at least `min_age` ago.
///
/// A write cancelled between creating its temp file and the rename leaves the
/// file behind. Younger files may belong to a write still in flight and are
/// kept. Returns the number of files removed.
pub async fn sweep_temp_files(root: &Path, min_age: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "cannot list storage root for temp sweep");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(TMP_PREFIX) || !name.ends_with(TMP_SUFFIX) {
            continue;
        }

        let age = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => now.duration_since(modified).unwrap_or_default(),
            Err(_) => continue,
        };
        if age < min_age {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::debug!(file = name, error = %e, "failed to remove stale temp file"),
        }
    }

    if removed > 0 {
        tracing::info!(root = %root.display(), removed, "removed abandoned temp files");
    }
    removed
}
