//! Two-tier cache for fetched resource blobs.
//!
//! This module composes a bounded in-memory tier with a flat on-disk tier:
//!
//! - Filesystem-safe key derivation (stripping sanitizer or SHA-256)
//! - Cost-bounded LRU memory cache behind a single lock
//! - Atomic (temp file + rename) disk writes under a resolved storage root
//! - Tier promotion on disk hits; disk writes are advisory

pub mod blob;
pub mod coordinator;
pub mod disk;
pub mod envelope;
pub mod key;
pub mod memory;
pub mod roots;

pub use crate::Error;

pub use blob::CachedBlob;
pub use coordinator::{CacheCoordinator, CacheError};
pub use disk::{DiskError, DiskStore};
pub use envelope::EnvelopeError;
pub use key::{KeyStrategy, sanitize};
pub use memory::{DEFAULT_COST_LIMIT, MemoryCache};
pub use roots::{StorageLocation, StorageRoots};
