//! Unified error types for loupe.
//!
//! Every variant names the pipeline stage that failed. "Not modified" is not
//! here: it is a successful fetch outcome, not an error.

/// Unified error types for the loupe load pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid load parameters (e.g., a non-positive scale).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The resource identifier is not a usable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Neither memory nor disk could serve the key, or the disk tier faulted.
    #[error("CACHE_UNAVAILABLE: {0}")]
    CacheUnavailable(String),

    /// Network request failed and no cached copy could stand in.
    #[error("NETWORK_ERROR: {0}")]
    NetworkError(String),

    /// Server answered with a status that is neither 2xx nor 304.
    #[error("HTTP_ERROR: status {0}")]
    HttpStatus(u16),

    /// Response body exceeded the configured byte limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// The bytes could not be decoded into a resource.
    #[error("DATA_CONVERSION_FAILED: {0}")]
    DataConversionFailed(String),

    /// The HTTP client could not be constructed.
    #[error("CLIENT_BUILD: {0}")]
    ClientBuild(String),
}

impl Error {
    /// Whether the failure came from the network boundary.
    ///
    /// Transport failures are the only ones that a stale cached copy may paper over.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::NetworkError(_) | Error::HttpStatus(_) | Error::FetchTooLarge(_))
    }
}
