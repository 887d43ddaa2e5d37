//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{LinkService, RedirectResolver};
use crate::domain::hit_worker::HitRecorder;
use crate::domain::repositories::LinkStore;
use crate::infrastructure::cache::CacheService;

/// Handles to the single shared store and the services built on it.
///
/// Cloning is cheap: every field is an `Arc` or a channel sender.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkStore>>,
    pub resolver: Arc<RedirectResolver<dyn LinkStore>>,
    pub store: Arc<dyn LinkStore>,
    pub cache: Arc<dyn CacheService>,
    pub hit_recorder: HitRecorder,
    /// Public origin without a trailing slash, e.g. `https://sho.rt`.
    pub base_url: Arc<str>,
}

impl AppState {
    /// Wires the services around one store instance.
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: Arc<dyn CacheService>,
        hit_recorder: HitRecorder,
        base_url: &str,
        slug_attempts: usize,
    ) -> Self {
        let link_service = LinkService::new(Arc::clone(&store), Arc::clone(&cache))
            .with_slug_attempts(slug_attempts);
        let resolver =
            RedirectResolver::new(Arc::clone(&store), Arc::clone(&cache), hit_recorder.clone());

        Self {
            link_service: Arc::new(link_service),
            resolver: Arc::new(resolver),
            store,
            cache,
            hit_recorder,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// Public URL for a slug.
    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url, slug)
    }
}
