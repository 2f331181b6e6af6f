//! Cached resource blobs.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A fetched resource body with the metadata needed to revalidate it.
///
/// Held identically in both cache tiers. A blob is never mutated; a newer
/// fetch produces a new blob that replaces the old one under the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBlob {
    pub data: Bytes,
    pub source_url: Option<String>,
    pub etag: Option<String>,
}

/// Metadata half of a [`CachedBlob`], as written into the disk envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMeta {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
}

impl CachedBlob {
    pub fn new(data: impl Into<Bytes>, source_url: Option<String>, etag: Option<String>) -> Self {
        Self { data: data.into(), source_url, etag }
    }

    /// Memory-tier cost of this blob: its byte count.
    pub fn cost(&self) -> usize {
        self.data.len()
    }

    pub fn meta(&self) -> BlobMeta {
        BlobMeta { source_url: self.source_url.clone(), etag: self.etag.clone() }
    }

    pub(crate) fn from_parts(meta: BlobMeta, data: Bytes) -> Self {
        Self { data, source_url: meta.source_url, etag: meta.etag }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_is_byte_count() {
        let blob = CachedBlob::new(vec![0u8; 42], None, None);
        assert_eq!(blob.cost(), 42);
    }

    #[test]
    fn test_meta_roundtrips_through_parts() {
        let blob = CachedBlob::new(
            Bytes::from_static(b"png"),
            Some("https://x/a.png".to_string()),
            Some("\"v1\"".to_string()),
        );
        let rebuilt = CachedBlob::from_parts(blob.meta(), blob.data.clone());
        assert_eq!(rebuilt, blob);
    }

    #[test]
    fn test_meta_tolerates_missing_fields() {
        let meta: BlobMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, BlobMeta::default());
    }
}
