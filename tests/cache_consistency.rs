mod common;

use std::sync::Arc;
use std::time::Duration;

use common::map_cache::{MapCache, Slot};
use slug_links::application::services::{LinkService, RedirectResolver};
use slug_links::domain::hit_event::HitEvent;
use slug_links::domain::hit_worker::HitRecorder;
use slug_links::infrastructure::persistence::MemoryLinkStore;
use tokio::sync::mpsc;

struct Harness {
    cache: Arc<MapCache>,
    links: LinkService<MemoryLinkStore>,
    resolver: RedirectResolver<MemoryLinkStore>,
    _hits: mpsc::Receiver<HitEvent>,
}

fn harness(fill_delay: Duration) -> Harness {
    let store = Arc::new(MemoryLinkStore::new());
    let cache = Arc::new(MapCache::with_fill_delay(fill_delay));
    let (hits, rx) = HitRecorder::channel(100);

    Harness {
        links: LinkService::new(store.clone(), cache.clone()),
        resolver: RedirectResolver::new(store, cache.clone(), hits),
        cache,
        _hits: rx,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_delete_during_slow_fill_is_not_resurrected() {
    let h = harness(Duration::from_millis(50));

    let link = h
        .links
        .create_link("alice", Some("abc".into()), "https://example.com")
        .await
        .unwrap();

    // Starts a fill that lands after the delete.
    assert!(h.resolver.resolve("abc").await.unwrap().is_some());

    h.links.delete_link("alice", link.id).await.unwrap();
    assert_eq!(h.resolver.resolve("abc").await.unwrap(), None);

    settle().await;

    assert_eq!(h.resolver.resolve("abc").await.unwrap(), None);
    assert_eq!(h.cache.fills(), 0);
    assert_eq!(h.cache.slot("abc"), Some(Slot::Tombstone));
}

#[tokio::test]
async fn test_rename_during_slow_fill_keeps_old_slug_dead() {
    let h = harness(Duration::from_millis(50));

    let link = h
        .links
        .create_link("alice", Some("old".into()), "https://example.com")
        .await
        .unwrap();
    assert!(h.resolver.resolve("old").await.unwrap().is_some());

    h.links.rename_link("alice", link.id, "new").await.unwrap();
    settle().await;

    assert_eq!(h.resolver.resolve("old").await.unwrap(), None);
    assert_eq!(
        h.resolver.resolve("new").await.unwrap().as_deref(),
        Some("https://example.com/")
    );
    assert_eq!(h.cache.fills(), 0);
}

#[tokio::test]
async fn test_landed_fill_is_replaced_by_delete() {
    let h = harness(Duration::ZERO);

    let link = h
        .links
        .create_link("alice", Some("abc".into()), "https://example.com")
        .await
        .unwrap();
    h.resolver.resolve("abc").await.unwrap();
    settle().await;

    assert_eq!(h.cache.fills(), 1);
    assert!(matches!(h.cache.slot("abc"), Some(Slot::Link(_))));

    h.links.delete_link("alice", link.id).await.unwrap();

    assert_eq!(h.cache.slot("abc"), Some(Slot::Tombstone));
    assert_eq!(h.resolver.resolve("abc").await.unwrap(), None);
}

#[tokio::test]
async fn test_reclaimed_slug_resolves_past_tombstone() {
    let h = harness(Duration::ZERO);

    let link = h
        .links
        .create_link("alice", Some("abc".into()), "https://alice.example")
        .await
        .unwrap();
    h.resolver.resolve("abc").await.unwrap();
    settle().await;

    h.links.delete_link("alice", link.id).await.unwrap();
    h.links
        .create_link("bob", Some("abc".into()), "https://bob.example")
        .await
        .unwrap();

    assert_eq!(
        h.resolver.resolve("abc").await.unwrap().as_deref(),
        Some("https://bob.example/")
    );
}
