//! End-to-end resource loading.
//!
//! ```text
//! Start -> CacheLookup -+-> hit  -> Revalidate (known ETag) -+-> Decode -> Done
//!                       +-> miss -> FreshFetch (no ETag)  ---+
//! ```
//!
//! A cache hit is always revalidated. `NotModified` reuses the cached bytes,
//! `Fresh` replaces them, and a transport failure falls back to the stale copy.
//! A miss has no such fallback. Any stage can end the load with an [`Error`].

use crate::decode::{Decoder, ImageDecoder, TargetSize};
use crate::fetch::{FetchClient, FetchConfig, FetchOutcome, Fetcher, TransportError, canonicalize};
use bytes::Bytes;
use loupe_core::cache::CacheError;
use loupe_core::{AppConfig, CacheCoordinator, CachedBlob, Error, StorageLocation};
use reqwest::Url;
use std::sync::Arc;

/// Per-call decode parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Display size to downsample toward; `None` decodes at full size.
    pub target_size: Option<TargetSize>,
    /// Pixels per display unit.
    pub scale: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { target_size: None, scale: 1.0 }
    }
}

impl LoadOptions {
    pub fn downsampled(width: u32, height: u32, scale: f32) -> Self {
        Self { target_size: Some(TargetSize::new(width, height)), scale }
    }

    fn validate(&self) -> Result<(), Error> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidInput(format!("scale must be a positive number, got {}", self.scale)));
        }
        Ok(())
    }
}

/// Which path produced the bytes that were decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Cached copy confirmed current by the server.
    Revalidated,
    /// Cached copy was stale and has been replaced.
    Refreshed,
    /// Nothing was cached; fetched from the network.
    Fetched,
    /// Cached copy used because revalidation failed.
    Stale,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Revalidated => "revalidated",
            LoadSource::Refreshed => "refreshed",
            LoadSource::Fetched => "fetched",
            LoadSource::Stale => "stale",
        }
    }
}

/// A decoded resource together with the blob it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub resource: T,
    pub blob: CachedBlob,
    pub source: LoadSource,
}

/// Orchestrates cache lookup, revalidation, persistence, and decoding.
pub struct ResourceLoader<F, D> {
    cache: Arc<CacheCoordinator>,
    fetcher: Arc<F>,
    decoder: Arc<D>,
    location: StorageLocation,
}

impl<F, D> Clone for ResourceLoader<F, D> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            fetcher: Arc::clone(&self.fetcher),
            decoder: Arc::clone(&self.decoder),
            location: self.location,
        }
    }
}

impl ResourceLoader<FetchClient, ImageDecoder> {
    /// Image loader built from configuration, with its own cache instance.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let cache = Arc::new(CacheCoordinator::from_config(config).await);
        let fetcher = FetchClient::new(FetchConfig::from(config))?;
        Ok(Self::new(cache, fetcher, ImageDecoder::new()))
    }
}

impl<F: Fetcher, D: Decoder> ResourceLoader<F, D> {
    /// Create a loader over `cache`, persisting to the cache location.
    pub fn new(cache: Arc<CacheCoordinator>, fetcher: F, decoder: D) -> Self {
        Self { cache, fetcher: Arc::new(fetcher), decoder: Arc::new(decoder), location: StorageLocation::Cache }
    }

    /// Persist to `location` instead of the cache location.
    pub fn with_location(mut self, location: StorageLocation) -> Self {
        self.location = location;
        self
    }

    pub fn cache(&self) -> &Arc<CacheCoordinator> {
        &self.cache
    }

    pub fn location(&self) -> StorageLocation {
        self.location
    }

    /// Load and decode the resource at `url`.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `url` does not parse as an http(s) URL
    /// - `InvalidInput` if `options.scale` is not a positive number
    /// - a transport error (`NetworkError`, `HttpStatus`, `FetchTooLarge`) on a
    ///   cache miss whose fetch failed
    /// - `DataConversionFailed` if the bytes do not decode
    pub async fn load(&self, url: &str, options: LoadOptions) -> Result<Loaded<D::Output>, Error> {
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        options.validate()?;

        let (blob, source) = match self.cache.load(self.location, url.as_str()).await {
            Ok(cached) => self.revalidate(&url, cached).await,
            Err(miss) => {
                match &miss {
                    CacheError::NotFound(_) => tracing::debug!(%url, "cache miss"),
                    other => tracing::warn!(%url, error = %other, "cache unavailable, fetching"),
                }
                self.fetch_fresh(&url).await?
            }
        };

        let resource = self.decode(blob.data.clone(), options).await?;
        Ok(Loaded { resource, blob, source })
    }

    async fn revalidate(&self, url: &Url, cached: CachedBlob) -> (CachedBlob, LoadSource) {
        match self.fetcher.fetch(url, cached.etag.as_deref()).await {
            FetchOutcome::NotModified => {
                tracing::debug!(%url, "cached copy still current");
                (cached, LoadSource::Revalidated)
            }
            FetchOutcome::Fresh(blob) => {
                tracing::debug!(%url, etag = ?blob.etag, "cached copy was stale, replacing");
                self.cache.save(self.location, url.as_str(), blob.clone()).await;
                (blob, LoadSource::Refreshed)
            }
            FetchOutcome::TransportError(e) => {
                tracing::warn!(%url, error = %e, "revalidation failed, using cached copy");
                (cached, LoadSource::Stale)
            }
        }
    }

    async fn fetch_fresh(&self, url: &Url) -> Result<(CachedBlob, LoadSource), Error> {
        match self.fetcher.fetch(url, None).await {
            FetchOutcome::Fresh(blob) => {
                self.cache.save(self.location, url.as_str(), blob.clone()).await;
                Ok((blob, LoadSource::Fetched))
            }
            FetchOutcome::NotModified => Err(TransportError::UnexpectedNotModified.into()),
            FetchOutcome::TransportError(e) => Err(e.into()),
        }
    }

    async fn decode(&self, data: Bytes, options: LoadOptions) -> Result<D::Output, Error> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&data, options.target_size, options.scale))
            .await
            .map_err(|e| Error::DataConversionFailed(format!("decode task failed: {}", e)))?
    }
}
