//! Slug normalization, validation and generation.
//!
//! # Policy
//!
//! - Length: 1-64 characters
//! - Allowed characters: ASCII letters, digits, hyphen, underscore
//! - Case-insensitive: letters are folded to lowercase before any lookup or
//!   uniqueness check, so `"Promo"` and `"promo"` are the same slug
//! - Reserved administrative paths are rejected after folding
//!
//! Validation is pure; nothing here touches storage.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::error::AppError;

pub const MIN_SLUG_LEN: usize = 1;
pub const MAX_SLUG_LEN: usize = 64;

/// Length of slugs generated when the caller does not supply one.
pub const GENERATED_SLUG_LEN: usize = 7;

const GENERATED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Slugs that collide with routes served by the service itself.
pub const RESERVED_SLUGS: &[&str] = &[
    "api",
    "admin",
    "health",
    "dashboard",
    "static",
    "assets",
    "login",
    "logout",
    "auth",
    "settings",
];

static SLUG_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug charset pattern is valid")
});

/// A slug that passed [`normalize_slug`].
///
/// The only ways to obtain one are through validation or from a store that
/// persisted a previously validated value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wraps a value read back from storage. Stored slugs were normalized on
    /// the way in, so they are not re-validated.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validates a candidate slug and folds it to its canonical lowercase form.
///
/// # Errors
///
/// Returns [`AppError::InvalidSlug`] if the candidate is empty, longer than
/// [`MAX_SLUG_LEN`], contains characters outside `[A-Za-z0-9_-]`, or is reserved.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_slug("My-Link").unwrap().as_str(), "my-link");
/// assert!(normalize_slug("admin").is_err());
/// assert!(normalize_slug("has space").is_err());
/// ```
pub fn normalize_slug(candidate: &str) -> Result<Slug, AppError> {
    let len = candidate.chars().count();
    if !(MIN_SLUG_LEN..=MAX_SLUG_LEN).contains(&len) {
        return Err(AppError::invalid_slug(
            format!("Slug must be {MIN_SLUG_LEN}-{MAX_SLUG_LEN} characters"),
            json!({ "provided_length": len }),
        ));
    }

    if !SLUG_CHARSET.is_match(candidate) {
        return Err(AppError::invalid_slug(
            "Slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": candidate }),
        ));
    }

    let folded = candidate.to_ascii_lowercase();

    if RESERVED_SLUGS.contains(&folded.as_str()) {
        return Err(AppError::invalid_slug(
            "This slug is reserved",
            json!({ "slug": folded }),
        ));
    }

    Ok(Slug(folded))
}

/// Generates a random candidate slug of [`GENERATED_SLUG_LEN`] lowercase
/// alphanumerics.
///
/// The result is not checked for uniqueness; callers claim it through the
/// store and retry on conflict.
pub fn generate_slug() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_SLUG_LEN)
        .map(|_| GENERATED_ALPHABET[rng.random_range(0..GENERATED_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_folds_case() {
        let slug = normalize_slug("My-Link_2024").unwrap();
        assert_eq!(slug.as_str(), "my-link_2024");
    }

    #[test]
    fn test_normalize_same_slug_regardless_of_case() {
        assert_eq!(normalize_slug("ABC").unwrap(), normalize_slug("abc").unwrap());
    }

    #[test]
    fn test_single_character_is_valid() {
        assert!(normalize_slug("x").is_ok());
    }

    #[test]
    fn test_max_length_is_valid() {
        let candidate = "a".repeat(MAX_SLUG_LEN);
        assert!(normalize_slug(&candidate).is_ok());
    }

    #[test]
    fn test_too_long() {
        let candidate = "a".repeat(MAX_SLUG_LEN + 1);
        let err = normalize_slug(&candidate).unwrap_err();
        assert!(matches!(err, AppError::InvalidSlug { .. }));
        assert!(err.to_string().contains("1-64 characters"));
    }

    #[test]
    fn test_empty_string() {
        assert!(matches!(
            normalize_slug("").unwrap_err(),
            AppError::InvalidSlug { .. }
        ));
    }

    #[test]
    fn test_rejects_whitespace() {
        assert!(normalize_slug(" abc").is_err());
        assert!(normalize_slug("my link").is_err());
    }

    #[test]
    fn test_rejects_special_characters() {
        for candidate in ["a/b", "a.b", "a?b", "a#b", "a%20b", "café"] {
            assert!(
                normalize_slug(candidate).is_err(),
                "'{}' should be rejected",
                candidate
            );
        }
    }

    #[test]
    fn test_reserved_slugs_rejected() {
        for &reserved in RESERVED_SLUGS {
            let err = normalize_slug(reserved).unwrap_err();
            assert!(err.to_string().contains("reserved"));
        }
    }

    #[test]
    fn test_reserved_check_happens_after_folding() {
        assert!(normalize_slug("ADMIN").is_err());
        assert!(normalize_slug("Api").is_err());
    }

    #[test]
    fn test_reserved_prefix_is_allowed() {
        assert!(normalize_slug("api-docs").is_ok());
    }

    #[test]
    fn test_generate_slug_shape() {
        let slug = generate_slug();
        assert_eq!(slug.len(), GENERATED_SLUG_LEN);
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_generated_slug_passes_validation() {
        for _ in 0..100 {
            let slug = generate_slug();
            let normalized = normalize_slug(&slug).unwrap();
            assert_eq!(normalized.as_str(), slug);
        }
    }

    #[test]
    fn test_generate_slug_produces_distinct_values() {
        let slugs: HashSet<String> = (0..1000).map(|_| generate_slug()).collect();
        assert_eq!(slugs.len(), 1000);
    }
}
