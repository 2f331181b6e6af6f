//! Storage locations and their resolved filesystem roots.

use super::disk::sweep_temp_files;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory created under each platform root.
const APP_DIR: &str = "loupe";

/// Temp files older than this are treated as abandoned by `prepare`.
const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Logical place a blob is persisted.
///
/// The environment may purge `Cache` at any time; `Document` is durable. The
/// cache logic treats both alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    #[default]
    Cache,
    Document,
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Cache => f.write_str("cache"),
            StorageLocation::Document => f.write_str("document"),
        }
    }
}

/// Absolute roots for each [`StorageLocation`].
///
/// A location with no root is a recoverable condition: the coordinator
/// reports it and the memory tier keeps working.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageRoots {
    cache: Option<PathBuf>,
    document: Option<PathBuf>,
}

impl StorageRoots {
    pub fn new(cache: Option<PathBuf>, document: Option<PathBuf>) -> Self {
        Self { cache, document }
    }

    /// Roots under the platform cache and document directories.
    pub fn platform() -> Self {
        Self {
            cache: dirs::cache_dir().map(|d| d.join(APP_DIR)),
            document: dirs::document_dir().map(|d| d.join(APP_DIR)),
        }
    }

    /// Explicit overrides where given, platform roots otherwise.
    pub fn with_overrides(cache: Option<PathBuf>, document: Option<PathBuf>) -> Self {
        let platform = Self::platform();
        Self { cache: cache.or(platform.cache), document: document.or(platform.document) }
    }

    /// Root directory for `location`, if one resolved.
    pub fn resolve(&self, location: StorageLocation) -> Option<&Path> {
        match location {
            StorageLocation::Cache => self.cache.as_deref(),
            StorageLocation::Document => self.document.as_deref(),
        }
    }

    /// Create every resolved root, dropping any that cannot be created.
    ///
    /// Called once at startup; the disk store itself never creates directories.
    /// Temp files abandoned by cancelled writes are swept from each root.
    pub async fn prepare(self) -> Self {
        Self { cache: ensure_dir(self.cache).await, document: ensure_dir(self.document).await }
    }
}

async fn ensure_dir(path: Option<PathBuf>) -> Option<PathBuf> {
    let path = path?;
    match tokio::fs::create_dir_all(&path).await {
        Ok(()) => {
            sweep_temp_files(&path, STALE_TEMP_AGE).await;
            Some(path)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "storage root unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve() {
        let roots = StorageRoots::new(Some(PathBuf::from("/tmp/c")), None);
        assert_eq!(roots.resolve(StorageLocation::Cache), Some(Path::new("/tmp/c")));
        assert_eq!(roots.resolve(StorageLocation::Document), None);
    }

    #[test]
    fn test_overrides_win() {
        let roots = StorageRoots::with_overrides(Some(PathBuf::from("/x")), Some(PathBuf::from("/y")));
        assert_eq!(roots.resolve(StorageLocation::Cache), Some(Path::new("/x")));
        assert_eq!(roots.resolve(StorageLocation::Document), Some(Path::new("/y")));
    }

    #[test]
    fn test_location_serde() {
        let loc: StorageLocation = serde_json::from_str("\"document\"").unwrap();
        assert_eq!(loc, StorageLocation::Document);
        assert_eq!(StorageLocation::Cache.to_string(), "cache");
    }

    #[tokio::test]
    async fn test_prepare_creates_roots() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("c").join("loupe");
        let roots = StorageRoots::new(Some(cache.clone()), None).prepare().await;

        assert!(cache.is_dir());
        assert_eq!(roots.resolve(StorageLocation::Cache), Some(cache.as_path()));
    }

    #[tokio::test]
    async fn test_prepare_keeps_recent_temp_files() {
        let dir = tempdir().unwrap();
        let tmp = dir.path().join(".loupe-42-0.tmp");
        std::fs::write(&tmp, b"in flight").unwrap();

        StorageRoots::new(Some(dir.path().to_path_buf()), None).prepare().await;
        assert!(tmp.exists());
    }

    #[tokio::test]
    async fn test_prepare_sweeps_abandoned_temp_files() {
        let dir = tempdir().unwrap();
        let tmp = dir.path().join(".loupe-42-1.tmp");
        std::fs::write(&tmp, b"abandoned").unwrap();
        let two_hours_ago = std::time::SystemTime::now() - Duration::from_secs(2 * 60 * 60);
        std::fs::File::options().write(true).open(&tmp).unwrap().set_modified(two_hours_ago).unwrap();

        StorageRoots::new(Some(dir.path().to_path_buf()), None).prepare().await;
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn test_prepare_drops_uncreatable_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();

        let roots = StorageRoots::new(Some(file.join("sub")), None).prepare().await;
        assert_eq!(roots.resolve(StorageLocation::Cache), None);
    }
}
