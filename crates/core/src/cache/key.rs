//! Filesystem-safe cache key derivation.
//!
//! Keys are URLs. The default strategy strips characters that are illegal or
//! meaningful in paths, which keeps filenames readable but lets two URLs that
//! differ only in stripped characters share a file. [`KeyStrategy::Hashed`]
//! trades readability for collision resistance.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Characters removed from keys before they are used as filenames.
const STRIPPED: &[char] = &['/', '\\', ':', '?', '%', '*', '|', '"', '<', '>'];

/// Longest filename most filesystems accept, in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// Prefix kept when an over-long key is shortened; the rest is a digest.
const TRUNCATED_PREFIX_BYTES: usize = 190;

/// How cache keys map to on-disk filenames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Strip unsafe characters from the key ([`sanitize`]).
    #[default]
    Sanitized,
    /// Hex SHA-256 of the raw key.
    Hashed,
}

impl KeyStrategy {
    /// Filename for `key` under this strategy.
    pub fn filename(&self, key: &str) -> String {
        match self {
            KeyStrategy::Sanitized => sanitize(key),
            KeyStrategy::Hashed => sha256_hex(key),
        }
    }
}

/// Map an arbitrary key to a filesystem-safe filename.
///
/// Removes path separators, `: ? % * | " < >` and control characters. Results
/// that would name `.`/`..` or nothing get a `_` prefix, and results longer
/// than 255 bytes are shortened to a prefix plus the SHA-256 of the whole.
/// The function is idempotent.
pub fn sanitize(raw: &str) -> String {
    let mut out: String = raw.chars().filter(|c| !STRIPPED.contains(c) && !c.is_control()).collect();

    if out.chars().all(|c| c == '.') {
        out.insert(0, '_');
    }

    if out.len() > MAX_FILENAME_BYTES {
        let digest = sha256_hex(&out);
        let mut cut = TRUNCATED_PREFIX_BYTES;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push('-');
        out.push_str(&digest);
    }

    out
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_url() {
        assert_eq!(sanitize("https://x/a.png"), "httpsxa.png");
    }

    #[test]
    fn test_sanitize_strips_every_reserved_char() {
        let s = sanitize(r#"a/b\c:d?e%f*g|h"i<j>k"#);
        assert_eq!(s, "abcdefghijk");
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize("a\0b\nc\u{7f}d"), "abcd");
    }

    #[test]
    fn test_sanitize_stable() {
        let a = sanitize("https://example.com/img.png?size=2");
        let b = sanitize("https://example.com/img.png?size=2");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitize_dot_names() {
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("/"), "_");
        assert_eq!(sanitize(".."), "_..");
        assert_eq!(sanitize("./."), "_..");
    }

    #[test]
    fn test_sanitize_long_key_is_bounded() {
        let long = format!("https://example.com/{}", "a".repeat(600));
        let s = sanitize(&long);
        assert!(s.len() <= MAX_FILENAME_BYTES);
        assert!(s.starts_with("httpsexample.comaaa"));
    }

    #[test]
    fn test_sanitize_long_keys_keep_distinct_suffix() {
        let a = sanitize(&format!("{}a", "x".repeat(400)));
        let b = sanitize(&format!("{}b", "x".repeat(400)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_long_multibyte_key() {
        let long = "é".repeat(300);
        let s = sanitize(&long);
        assert!(s.len() <= MAX_FILENAME_BYTES);
        assert_eq!(sanitize(&s), s);
    }

    #[test]
    fn test_known_collision_under_sanitized_strategy() {
        let a = KeyStrategy::Sanitized.filename("https://x/a?b=c/d");
        let b = KeyStrategy::Sanitized.filename("https://x/a?b=cd");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hashed_strategy_separates_collisions() {
        let a = KeyStrategy::Hashed.filename("https://x/a?b=c/d");
        let b = KeyStrategy::Hashed.filename("https://x/a?b=cd");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(s in any::<String>()) {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_has_no_reserved_chars(s in any::<String>()) {
            let out = sanitize(&s);
            prop_assert!(!out.is_empty());
            prop_assert!(out.len() <= MAX_FILENAME_BYTES);
            prop_assert!(!out.chars().any(|c| STRIPPED.contains(&c) || c.is_control()));
        }
    }
}
