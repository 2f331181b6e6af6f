//! Conditional HTTP fetch for cached resources.
//!
//! ### Revalidation
//! - A known ETag is sent as `If-None-Match`.
//! - `304 Not Modified` is a successful outcome of its own, not an error.
//! - `2xx` yields fresh bytes plus the response ETag (which may be absent).
//!
//! ### Cache Bypass
//! - Requests carry `Cache-Control: no-cache` so intermediaries revalidate
//!   with the origin; the caller's cache tiers are authoritative.
//!
//! ### Limits
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 20MB (configurable)
//! - Timeouts are the HTTP client's own; no extra layer is added.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize};

use loupe_core::{AppConfig, CachedBlob, Error};

/// Result of one network attempt.
///
/// `NotModified` is neither success-with-data nor failure; every caller has
/// to branch on it explicitly.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// New bytes, with the source URL and response ETag attached.
    Fresh(CachedBlob),
    /// The server confirmed the caller's ETag still matches.
    NotModified,
    /// The request failed or the response was unusable.
    TransportError(TransportError),
}

/// Network-boundary failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("{size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },

    /// A 304 arrived for a request that carried no ETag.
    #[error("not modified without a conditional request")]
    UnexpectedNotModified,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout } else { TransportError::Network(err.to_string()) }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status(code) => Error::HttpStatus(code),
            e @ TransportError::TooLarge { .. } => Error::FetchTooLarge(e.to_string()),
            e => Error::NetworkError(e.to_string()),
        }
    }
}

/// Network side of the loader: fetch `url`, conditionally on `known_etag`.
///
/// Implementations never persist what they fetch.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &reqwest::Url, known_etag: Option<&str>) -> FetchOutcome;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "loupe/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 20MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "loupe/0.1".to_string(),
            max_bytes: 20 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::ClientBuild(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn send(&self, url: &reqwest::Url, known_etag: Option<&str>) -> Result<FetchOutcome, TransportError> {
        let start = Instant::now();

        let mut request = self
            .http
            .get(url.clone())
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache");

        let mut conditional = false;
        if let Some(etag) = known_etag {
            match HeaderValue::from_str(etag) {
                Ok(value) => {
                    request = request.header(header::IF_NONE_MATCH, value);
                    conditional = true;
                }
                Err(_) => tracing::warn!(%url, etag, "cached ETag is not a valid header value, fetching unconditionally"),
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if !conditional {
                return Err(TransportError::UnexpectedNotModified);
            }
            tracing::debug!("{} not modified ({}ms)", url, start.elapsed().as_millis());
            return Ok(FetchOutcome::NotModified);
        }

        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(TransportError::TooLarge { size: len, limit: self.config.max_bytes });
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes: Bytes = response.bytes().await?;

        if bytes.len() > self.config.max_bytes {
            return Err(TransportError::TooLarge { size: bytes.len() as u64, limit: self.config.max_bytes });
        }

        tracing::debug!(
            "fetched {} in {}ms ({} bytes, etag {:?})",
            url,
            start.elapsed().as_millis(),
            bytes.len(),
            etag
        );

        Ok(FetchOutcome::Fresh(CachedBlob::new(bytes, Some(url.to_string()), etag)))
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, url: &reqwest::Url, known_etag: Option<&str>) -> FetchOutcome {
        match self.send(url, known_etag).await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::TransportError(e),
        }
    }
}
