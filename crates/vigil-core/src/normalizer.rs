//! Deterministic URL canonicalization.
//!
//! The normalized form is the dedup key for targets, so two spellings of the
//! same page must map to the same string.

use crate::error::{Result, VigilError};
use url::Url;

/// Canonicalize an input URL.
///
/// Trims whitespace, requires an absolute `http`/`https` URL with a host,
/// lower-cases scheme and host, drops default ports, resolves dot segments,
/// guarantees a path (`/` at minimum) and strips the fragment.
///
/// # Errors
/// Returns `VigilError::InvalidUrl` when the input cannot be parsed or is not
/// an http(s) URL with a host.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VigilError::InvalidUrl("empty URL".to_string()));
    }

    let mut url =
        Url::parse(trimmed).map_err(|e| VigilError::InvalidUrl(format!("'{trimmed}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(VigilError::InvalidUrl(format!(
            "unsupported scheme '{}' in '{trimmed}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(VigilError::InvalidUrl(format!("missing host in '{trimmed}'")));
    }

    url.set_fragment(None);
    Ok(url.to_string())
}

/// Extract the host of an already normalized URL.
///
/// # Errors
/// Returns `VigilError::InvalidUrl` when the URL has no host.
pub fn extract_hostname(normalized_url: &str) -> Result<String> {
    Url::parse(normalized_url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .ok_or_else(|| VigilError::InvalidUrl(format!("no host in '{normalized_url}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical_forms() {
        let cases = [
            ("  https://Example.COM  ", "https://example.com/"),
            ("HTTP://example.com:80/a/./b/../c", "http://example.com/a/c"),
            ("https://example.com:443/", "https://example.com/"),
            ("https://example.com/page#section", "https://example.com/page"),
            ("https://example.com/search?q=1", "https://example.com/search?q=1"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_url(input).expect(input), expected);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_url("https://Example.com/a/../b").expect("normalize");
        let twice = normalize_url(&once).expect("normalize again");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("example.com").is_err());
        assert!(normalize_url("ftp://example.com/file").is_err());
        assert!(normalize_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_extract_hostname() {
        assert_eq!(
            extract_hostname("https://www.example.com/path").expect("host"),
            "www.example.com"
        );
        assert!(extract_hostname("not a url").is_err());
    }
}
