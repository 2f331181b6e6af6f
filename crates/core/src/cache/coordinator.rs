//! Read/write front over the memory and disk tiers.
//!
//! Reads check memory, then disk, promoting disk hits into memory. Writes
//! always land in memory; the disk copy is best effort and its failures are
//! logged, never returned.

use super::blob::CachedBlob;
use super::disk::{DiskError, DiskStore};
use super::envelope;
use super::key::KeyStrategy;
use super::memory::{DEFAULT_COST_LIMIT, MemoryCache};
use super::roots::{StorageLocation, StorageRoots};
use crate::{AppConfig, Error};
use std::sync::Arc;
use tokio::sync::OnceCell;

static SHARED: OnceCell<Arc<CacheCoordinator>> = OnceCell::const_new();

/// Why a coordinator lookup produced no blob.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("no file path for location: {0}")]
    NoFilePathForLocation(StorageLocation),

    #[error("not cached: {0}")]
    NotFound(String),

    /// The disk tier faulted or held an unreadable record.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        Error::CacheUnavailable(err.to_string())
    }
}

/// Two-tier blob cache.
pub struct CacheCoordinator {
    memory: MemoryCache<CachedBlob>,
    disk: DiskStore,
    roots: StorageRoots,
}

impl CacheCoordinator {
    pub fn new(memory_cost_limit: usize, roots: StorageRoots, key_strategy: KeyStrategy) -> Self {
        Self { memory: MemoryCache::new(memory_cost_limit), disk: DiskStore::new(key_strategy), roots }
    }

    /// Build from configuration, creating the storage roots.
    pub async fn from_config(config: &AppConfig) -> Self {
        let roots = config.storage_roots().prepare().await;
        Self::new(config.memory_cost_limit, roots, config.key_strategy)
    }

    /// Process-wide instance with default settings, created on first use.
    ///
    /// Independent instances can always be built with [`CacheCoordinator::new`].
    pub async fn shared() -> Arc<Self> {
        SHARED
            .get_or_init(|| async {
                let roots = StorageRoots::platform().prepare().await;
                Arc::new(Self::new(DEFAULT_COST_LIMIT, roots, KeyStrategy::default()))
            })
            .await
            .clone()
    }

    /// Look up `key`, memory first, then the disk root for `location`.
    pub async fn load(&self, location: StorageLocation, key: &str) -> Result<CachedBlob, CacheError> {
        if let Some(blob) = self.memory.get(key) {
            tracing::debug!(key, "memory cache hit");
            return Ok(blob);
        }

        let root = self
            .roots
            .resolve(location)
            .ok_or(CacheError::NoFilePathForLocation(location))?;

        let raw = match self.disk.read(root, key).await {
            Ok(raw) => raw,
            Err(DiskError::NotFound { .. }) => return Err(CacheError::NotFound(key.to_string())),
            Err(e) => return Err(CacheError::Unavailable(e.to_string())),
        };

        let blob = envelope::decode(raw)
            .map_err(|e| CacheError::Unavailable(format!("unreadable record for {key}: {e}")))?;

        tracing::debug!(key, %location, bytes = blob.data.len(), "disk cache hit, promoting to memory");
        self.memory.put(key, blob.clone(), blob.cost());
        Ok(blob)
    }

    /// Store `blob` under `key` in memory and, best effort, on disk.
    pub async fn save(&self, location: StorageLocation, key: &str, blob: CachedBlob) {
        self.memory.put(key, blob.clone(), blob.cost());

        let Some(root) = self.roots.resolve(location) else {
            tracing::warn!(key, %location, "no storage root, blob kept in memory only");
            return;
        };

        let encoded = match envelope::encode(&blob) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode cache record");
                return;
            }
        };

        if let Err(e) = self.disk.write(root, key, &encoded).await {
            tracing::warn!(key, %location, error = %e, "disk cache write failed");
        }
    }

    /// Drop the memory tier, as happens under memory pressure.
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    pub fn memory(&self) -> &MemoryCache<CachedBlob> {
        &self.memory
    }

    pub fn disk(&self) -> &DiskStore {
        &self.disk
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }
}
