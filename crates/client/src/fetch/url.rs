//! Resource URL validation and cache-key normalization.

use url::Url;

/// Error type for resource URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a resource identifier into the URL that is fetched and cached.
///
/// Whitespace is trimmed, a missing scheme defaults to `https`, and the
/// fragment is dropped since it never reaches the server. The parser already
/// lowercases the host and normalizes the path; the query is kept verbatim.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{trimmed}")).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost(trimmed.to_string()));
    }

    parsed.set_fragment(None);
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_image_url() {
        let url = canonicalize("https://cdn.example.com/img/a.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/img/a.png");
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com/a.png").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), "/a.png");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://CDN.Example.COM/A.png").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
        assert_eq!(url.path(), "/A.png");
    }

    #[test]
    fn test_canonicalize_drops_fragment_keeps_query() {
        let url = canonicalize("  https://x/a.png?w=100&h=50#top ").unwrap();
        assert_eq!(url.as_str(), "https://x/a.png?w=100&h=50");
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("data:image/png;base64,AAAA"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_rejects_empty() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_canonicalize_rejects_garbage() {
        assert!(matches!(canonicalize("not a url"), Err(UrlError::InvalidUrl(_))));
        assert!(matches!(canonicalize("https://exa mple.com/"), Err(UrlError::InvalidUrl(_))));
    }
}
