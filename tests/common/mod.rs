#![allow(dead_code)]

pub mod map_cache;

use std::sync::Arc;

use axum_test::TestServer;
use slug_links::domain::hit_event::HitEvent;
use slug_links::domain::hit_worker::{HitRecorder, apply_hit};
use slug_links::domain::repositories::LinkStore;
use slug_links::infrastructure::cache::NullCache;
use slug_links::infrastructure::persistence::MemoryLinkStore;
use slug_links::routes::build_router;
use slug_links::state::AppState;
use slug_links::utils::slug::{Slug, normalize_slug};
use tokio::sync::mpsc;

pub const BASE_URL: &str = "https://sho.rt";

pub fn slug(s: &str) -> Slug {
    normalize_slug(s).unwrap()
}

/// State over a fresh in-memory store. Hits stay in the returned receiver
/// until a test applies them.
pub fn create_test_state() -> (AppState, mpsc::Receiver<HitEvent>, Arc<MemoryLinkStore>) {
    let store = Arc::new(MemoryLinkStore::new());
    let (hits, rx) = HitRecorder::channel(100);

    let state = AppState::new(
        store.clone() as Arc<dyn LinkStore>,
        Arc::new(NullCache::new()),
        hits,
        BASE_URL,
        10,
    );

    (state, rx, store)
}

pub fn create_test_server() -> (TestServer, mpsc::Receiver<HitEvent>, Arc<MemoryLinkStore>) {
    let (state, rx, store) = create_test_state();
    let server = TestServer::new(build_router(state)).unwrap();
    (server, rx, store)
}

/// Applies every hit currently queued.
pub async fn settle_hits(rx: &mut mpsc::Receiver<HitEvent>, store: &MemoryLinkStore) -> usize {
    let mut applied = 0;
    while let Ok(event) = rx.try_recv() {
        apply_hit(store, event).await;
        applied += 1;
    }
    applied
}
