//! Public slug resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::LinkRecord;
use crate::domain::hit_event::HitEvent;
use crate::domain::hit_worker::HitRecorder;
use crate::domain::repositories::LinkStore;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::utils::slug::{Slug, normalize_slug};

/// Read path behind `GET /{slug}`.
///
/// Answers from the cache when it can and from the store otherwise. Every
/// successful resolution queues a hit on the [`HitRecorder`]; the caller never
/// waits for the counter.
pub struct RedirectResolver<S: LinkStore + ?Sized> {
    store: Arc<S>,
    cache: Arc<dyn CacheService>,
    hits: HitRecorder,
}

impl<S: LinkStore + ?Sized + 'static> RedirectResolver<S> {
    pub fn new(store: Arc<S>, cache: Arc<dyn CacheService>, hits: HitRecorder) -> Self {
        Self { store, cache, hits }
    }

    /// Resolves `slug` to its target URL.
    ///
    /// Slugs that fail validation cannot exist in the store and resolve to
    /// `None` without a lookup.
    ///
    /// # Errors
    ///
    /// Propagates store failures ([`AppError::Unavailable`] on connection
    /// loss). Cache failures are treated as misses.
    pub async fn resolve(&self, slug: &str) -> Result<Option<String>, AppError> {
        let Ok(slug) = normalize_slug(slug) else {
            debug!(slug, "Unresolvable slug");
            return Ok(None);
        };

        match self.cache.get(slug.as_str()).await {
            Ok(Some(cached)) => {
                self.hits.record(HitEvent::new(cached.id, slug.as_str()));
                return Ok(Some(cached.target_url));
            }
            Ok(None) => {}
            Err(e) => warn!(slug = %slug, error = %e, "Cache lookup failed"),
        }

        let Some(record) = self.store.get_by_slug(&slug).await? else {
            debug!(slug = %slug, "Slug not found");
            return Ok(None);
        };

        if self.cache.is_enabled() {
            self.spawn_cache_fill(slug.clone(), &record);
        }

        self.hits.record(HitEvent::new(record.id, slug.into_inner()));
        Ok(Some(record.target_url))
    }

    /// Caches a resolution off the request path.
    ///
    /// The write is insert-only, so a rename or delete that invalidated the
    /// slug after our store read has left a tombstone the fill cannot
    /// replace. If the tombstone already expired, the record is re-read
    /// after the write and the entry dropped unless it still matches.
    fn spawn_cache_fill(&self, slug: Slug, record: &LinkRecord) {
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let entry = CachedLink {
            id: record.id,
            target_url: record.target_url.clone(),
        };

        tokio::spawn(async move {
            match cache.set_if_absent(slug.as_str(), &entry, None).await {
                Ok(true) => {}
                Ok(false) => return,
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Cache fill failed");
                    return;
                }
            }

            let still_current = match store.get_by_id(entry.id).await {
                Ok(found) => found
                    .is_some_and(|r| r.slug == slug && r.target_url == entry.target_url),
                Err(_) => false,
            };

            if !still_current {
                debug!(slug = %slug, "Link changed during cache fill, dropping entry");
                if let Err(e) = cache.invalidate(slug.as_str()).await {
                    warn!(slug = %slug, error = %e, "Cache invalidation failed");
                }
            }
        });
    }
}
