//! Target URL validation and canonicalization.
//!
//! A link's target must be an absolute `http`/`https` URL. Accepted targets are
//! stored in canonical form: lowercase host, no default port, no fragment.

use url::Url;

/// Upper bound on stored target length.
pub const MAX_TARGET_URL_LEN: usize = 2048;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS targets are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URL exceeds {MAX_TARGET_URL_LEN} characters")]
    TooLong,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Parses `input` as an absolute URL and returns its canonical string form.
///
/// Query strings and path case are preserved. `javascript:`, `data:`, `file:`
/// and other non-web schemes are rejected.
///
/// # Errors
///
/// See [`UrlNormalizationError`].
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    if input.len() > MAX_TARGET_URL_LEN {
        return Err(UrlNormalizationError::TooLong);
    }

    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlNormalizationError::MissingHost)?
        .to_ascii_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlNormalizationError::NormalizationFailed(e.to_string()))?;

    url.set_fragment(None);

    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_https() {
        assert_eq!(
            normalize_url("https://example.com").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_lowercases_host_but_not_path() {
        assert_eq!(
            normalize_url("HTTPS://EXAMPLE.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_strips_default_ports() {
        assert_eq!(
            normalize_url("http://example.com:80/a").unwrap(),
            "http://example.com/a"
        );
        assert_eq!(
            normalize_url("https://example.com:443/a").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_keeps_custom_port() {
        assert_eq!(
            normalize_url("http://localhost:8080/x").unwrap(),
            "http://localhost:8080/x"
        );
    }

    #[test]
    fn test_strips_fragment_keeps_query() {
        assert_eq!(
            normalize_url("https://example.com/page?q=Rust#top").unwrap(),
            "https://example.com/page?q=Rust"
        );
    }

    #[test]
    fn test_relative_url_rejected() {
        assert!(matches!(
            normalize_url("/just/a/path").unwrap_err(),
            UrlNormalizationError::InvalidFormat(_)
        ));
        assert!(matches!(
            normalize_url("example.com").unwrap_err(),
            UrlNormalizationError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_non_web_schemes_rejected() {
        for input in [
            "javascript:alert(1)",
            "data:text/plain,hi",
            "file:///etc/passwd",
            "ftp://example.com/f",
            "mailto:a@example.com",
        ] {
            assert!(
                matches!(
                    normalize_url(input).unwrap_err(),
                    UrlNormalizationError::UnsupportedProtocol
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_string() {
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_too_long() {
        let input = format!("https://example.com/{}", "a".repeat(MAX_TARGET_URL_LEN));
        assert!(matches!(
            normalize_url(&input).unwrap_err(),
            UrlNormalizationError::TooLong
        ));
    }
}
