//! Link record binding a slug to a target URL.

use chrono::{DateTime, Utc};

use crate::utils::slug::Slug;

/// A live short link.
///
/// `id`, `owner_id` and `created_at` never change. `slug`, `target_url` and
/// `updated_at` change through store updates; `hit_count` only grows, and is
/// not reflected in `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub id: i64,
    pub owner_id: String,
    pub slug: Slug,
    pub target_url: String,
    pub hit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Creates a record as it exists right after insertion.
    pub fn new(
        id: i64,
        owner_id: String,
        slug: Slug,
        target_url: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            slug,
            target_url,
            hit_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    /// Returns true if `owner_id` created this record.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

/// Input for inserting a new record. Slug and URL are already normalized.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub owner_id: String,
    pub slug: Slug,
    pub target_url: String,
}

/// Metadata change applied atomically by the store.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub slug: Option<Slug>,
    pub target_url: Option<String>,
}

impl LinkPatch {
    /// A patch that only moves the record to `slug`.
    pub fn rename(slug: Slug) -> Self {
        Self {
            slug: Some(slug),
            target_url: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slug.is_none() && self.target_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::slug::normalize_slug;

    #[test]
    fn test_new_record_starts_with_zero_hits() {
        let now = Utc::now();
        let link = LinkRecord::new(
            1,
            "owner-1".to_string(),
            normalize_slug("abc").unwrap(),
            "https://example.com/".to_string(),
            now,
        );

        assert_eq!(link.hit_count, 0);
        assert_eq!(link.created_at, now);
        assert_eq!(link.updated_at, now);
        assert_eq!(link.slug.as_str(), "abc");
    }

    #[test]
    fn test_is_owned_by() {
        let link = LinkRecord::new(
            1,
            "alice".to_string(),
            normalize_slug("abc").unwrap(),
            "https://example.com/".to_string(),
            Utc::now(),
        );

        assert!(link.is_owned_by("alice"));
        assert!(!link.is_owned_by("bob"));
    }

    #[test]
    fn test_patch_rename() {
        let patch = LinkPatch::rename(normalize_slug("new").unwrap());
        assert_eq!(patch.slug.unwrap().as_str(), "new");
        assert!(patch.target_url.is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(LinkPatch::default().is_empty());
    }
}
