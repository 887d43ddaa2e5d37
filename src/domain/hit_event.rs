//! Hit event model for asynchronous hit counting.

/// A resolved redirect waiting to be counted.
///
/// Created by the redirect resolver once the target URL is known and handed
/// to the background worker, so the redirect response never waits on the
/// counter write.
///
/// `slug` is carried for logging only; the increment is keyed by `link_id`,
/// which stays stable across renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitEvent {
    pub link_id: i64,
    pub slug: String,
}

impl HitEvent {
    pub fn new(link_id: i64, slug: impl Into<String>) -> Self {
        Self {
            link_id,
            slug: slug.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_event_creation() {
        let event = HitEvent::new(42, "abc");
        assert_eq!(event.link_id, 42);
        assert_eq!(event.slug, "abc");
    }
}
