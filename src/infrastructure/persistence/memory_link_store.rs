//! In-process link store.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::json;
use tracing::debug;

use crate::domain::entities::{LinkPatch, LinkRecord, NewLink};
use crate::domain::repositories::{LinkStore, StoreStats};
use crate::error::AppError;
use crate::utils::slug::Slug;

struct StoredLink {
    id: i64,
    owner_id: String,
    slug: Slug,
    target_url: String,
    hits: AtomicI64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredLink {
    fn snapshot(&self) -> LinkRecord {
        LinkRecord {
            id: self.id,
            owner_id: self.owner_id.clone(),
            slug: self.slug.clone(),
            target_url: self.target_url.clone(),
            hit_count: self.hits.load(Ordering::Acquire),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Default)]
struct Tables {
    by_slug: HashMap<Slug, i64>,
    by_id: HashMap<i64, StoredLink>,
    by_owner: HashMap<String, HashSet<i64>>,
}

/// Link store held entirely in memory.
///
/// All three indexes sit behind one [`RwLock`], so a slug claim, a rename or a
/// delete is a single critical section under the write lock. Hit counters are
/// per-record atomics bumped under the read lock: increments never wait on
/// each other, and an increment racing a delete either lands first or sees
/// the record gone.
///
/// Contents are lost on restart; use [`super::PgLinkStore`] for durability.
pub struct MemoryLinkStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        debug!("Using in-memory link store");
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn not_found(id: i64) -> AppError {
        AppError::not_found("Link not found", json!({ "id": id }))
    }

    fn slug_taken(slug: &Slug) -> AppError {
        AppError::conflict("Slug is already claimed", json!({ "slug": slug }))
    }
}

impl Default for MemoryLinkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        let mut tables = self.tables.write();

        let id = match tables.by_slug.entry(new_link.slug.clone()) {
            Entry::Occupied(_) => return Err(Self::slug_taken(&new_link.slug)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                slot.insert(id);
                id
            }
        };

        let now = Utc::now();
        let stored = StoredLink {
            id,
            owner_id: new_link.owner_id,
            slug: new_link.slug,
            target_url: new_link.target_url,
            hits: AtomicI64::new(0),
            created_at: now,
            updated_at: now,
        };
        let record = stored.snapshot();

        tables
            .by_owner
            .entry(stored.owner_id.clone())
            .or_default()
            .insert(id);
        tables.by_id.insert(id, stored);

        Ok(record)
    }

    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<LinkRecord>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .by_slug
            .get(slug)
            .and_then(|id| tables.by_id.get(id))
            .map(StoredLink::snapshot))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError> {
        let tables = self.tables.read();
        Ok(tables.by_id.get(&id).map(StoredLink::snapshot))
    }

    async fn increment_hit(&self, id: i64) -> Result<(), AppError> {
        let tables = self.tables.read();
        let stored = tables.by_id.get(&id).ok_or_else(|| Self::not_found(id))?;
        stored.hits.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError> {
        let mut guard = self.tables.write();
        let Tables { by_slug, by_id, .. } = &mut *guard;

        let stored = by_id.get_mut(&id).ok_or_else(|| Self::not_found(id))?;

        if let Some(new_slug) = patch.slug
            && new_slug != stored.slug
        {
            match by_slug.entry(new_slug.clone()) {
                Entry::Occupied(_) => return Err(Self::slug_taken(&new_slug)),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            by_slug.remove(&stored.slug);
            stored.slug = new_slug;
        }

        if let Some(target_url) = patch.target_url {
            stored.target_url = target_url;
        }

        stored.updated_at = Utc::now();
        Ok(stored.snapshot())
    }

    async fn delete(&self, id: i64) -> Result<LinkRecord, AppError> {
        let mut guard = self.tables.write();
        let tables = &mut *guard;

        let stored = tables.by_id.remove(&id).ok_or_else(|| Self::not_found(id))?;
        tables.by_slug.remove(&stored.slug);

        if let Some(ids) = tables.by_owner.get_mut(&stored.owner_id) {
            ids.remove(&id);
            if ids.is_empty() {
                tables.by_owner.remove(&stored.owner_id);
            }
        }

        Ok(stored.snapshot())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        let tables = self.tables.read();

        let mut links: Vec<LinkRecord> = tables
            .by_owner
            .get(owner_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.by_id.get(id))
                    .map(StoredLink::snapshot)
                    .collect()
            })
            .unwrap_or_default();

        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(links)
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        let tables = self.tables.read();
        Ok(StoreStats {
            links: tables.by_id.len() as i64,
            hits: tables
                .by_id
                .values()
                .map(|s| s.hits.load(Ordering::Acquire))
                .sum(),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}
