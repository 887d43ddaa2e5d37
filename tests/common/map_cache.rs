use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use slug_links::infrastructure::cache::{CacheResult, CacheService, CachedLink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Link(CachedLink),
    Tombstone,
}

/// In-process cache following the fill/tombstone contract. Fills sleep for
/// `fill_delay` before landing, like a slow network write. Tombstones never
/// expire here.
#[derive(Default)]
pub struct MapCache {
    slots: Mutex<HashMap<String, Slot>>,
    fill_delay: Duration,
    fills: AtomicUsize,
}

impl MapCache {
    pub fn with_fill_delay(fill_delay: Duration) -> Self {
        Self {
            fill_delay,
            ..Self::default()
        }
    }

    pub fn slot(&self, slug: &str) -> Option<Slot> {
        self.slots.lock().get(slug).cloned()
    }

    /// Fills that were actually written.
    pub fn fills(&self) -> usize {
        self.fills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheService for MapCache {
    async fn get(&self, slug: &str) -> CacheResult<Option<CachedLink>> {
        Ok(match self.slots.lock().get(slug) {
            Some(Slot::Link(link)) => Some(link.clone()),
            _ => None,
        })
    }

    async fn set_if_absent(
        &self,
        slug: &str,
        link: &CachedLink,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<bool> {
        tokio::time::sleep(self.fill_delay).await;

        let mut slots = self.slots.lock();
        if slots.contains_key(slug) {
            return Ok(false);
        }
        slots.insert(slug.to_string(), Slot::Link(link.clone()));
        self.fills.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        self.slots.lock().insert(slug.to_string(), Slot::Tombstone);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "map"
    }
}
