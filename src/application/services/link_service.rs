//! Owner-facing link management.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{LinkPatch, LinkRecord, NewLink};
use crate::domain::repositories::LinkStore;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug::{Slug, generate_slug, normalize_slug};
use crate::utils::url_normalizer::normalize_url;

/// Insert attempts for generated slugs when none is configured.
pub const DEFAULT_SLUG_ATTEMPTS: usize = 10;

/// Requested metadata change. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub slug: Option<String>,
    pub target_url: Option<String>,
}

/// Service for creating, changing and removing short links.
///
/// Validates input, enforces ownership, and keeps the resolution cache in
/// step with the store. The store itself is owner-agnostic: every ownership
/// decision is made here before a store mutation is issued.
pub struct LinkService<S: LinkStore + ?Sized> {
    store: Arc<S>,
    cache: Arc<dyn CacheService>,
    slug_attempts: usize,
}

impl<S: LinkStore + ?Sized> LinkService<S> {
    /// Creates a new link service.
    pub fn new(store: Arc<S>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            store,
            cache,
            slug_attempts: DEFAULT_SLUG_ATTEMPTS,
        }
    }

    /// Sets how many generated slugs are tried before giving up.
    pub fn with_slug_attempts(mut self, attempts: usize) -> Self {
        self.slug_attempts = attempts.max(1);
        self
    }

    /// Creates a link for `owner_id`.
    ///
    /// A missing or empty `slug` gets a generated one. Generated slugs are
    /// retried on [`AppError::Conflict`] only; any other store error ends the
    /// loop immediately.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] if `target_url` is not an absolute http(s) URL
    /// - [`AppError::InvalidSlug`] if the supplied slug fails validation
    /// - [`AppError::Conflict`] if the supplied slug is taken, or every
    ///   generated candidate collided
    /// - [`AppError::Unavailable`] if the store cannot be reached
    pub async fn create_link(
        &self,
        owner_id: &str,
        slug: Option<String>,
        target_url: &str,
    ) -> Result<LinkRecord, AppError> {
        let target_url = parse_target_url(target_url)?;

        if let Some(candidate) = slug.filter(|s| !s.is_empty()) {
            let slug = normalize_slug(&candidate)?;
            let record = self
                .store
                .insert(NewLink {
                    owner_id: owner_id.to_string(),
                    slug,
                    target_url,
                })
                .await?;

            info!(id = record.id, slug = %record.slug, owner_id, "Link created");
            return Ok(record);
        }

        for attempt in 1..=self.slug_attempts {
            let slug = normalize_slug(&generate_slug())?;

            let new_link = NewLink {
                owner_id: owner_id.to_string(),
                slug,
                target_url: target_url.clone(),
            };

            match self.store.insert(new_link).await {
                Ok(record) => {
                    info!(id = record.id, slug = %record.slug, owner_id, "Link created");
                    return Ok(record);
                }
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated slug collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = self.slug_attempts,
            "Could not find a free generated slug"
        );

        Err(AppError::conflict(
            "Failed to allocate a unique slug",
            json!({ "reason": "slug_space_exhausted", "attempts": self.slug_attempts }),
        ))
    }

    /// Returns one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `id` does not exist and
    /// [`AppError::Forbidden`] if it belongs to someone else.
    pub async fn get_link(&self, owner_id: &str, id: i64) -> Result<LinkRecord, AppError> {
        self.owned_link(owner_id, id).await
    }

    /// Moves a link to `new_slug`.
    ///
    /// The store swaps the slug claim atomically: on [`AppError::Conflict`]
    /// the link keeps its current slug.
    pub async fn rename_link(
        &self,
        owner_id: &str,
        id: i64,
        new_slug: &str,
    ) -> Result<LinkRecord, AppError> {
        let current = self.owned_link(owner_id, id).await?;
        let new_slug = normalize_slug(new_slug)?;

        let renamed = self.store.rename_slug(id, &new_slug).await?;

        self.invalidate(&current.slug).await;
        if renamed.slug != current.slug {
            self.invalidate(&renamed.slug).await;
        }

        info!(id, from = %current.slug, to = %renamed.slug, "Link renamed");
        Ok(renamed)
    }

    /// Renames and/or retargets a link in one atomic store update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `update` changes nothing, plus the
    /// errors of [`Self::create_link`] and [`Self::get_link`].
    pub async fn update_link(
        &self,
        owner_id: &str,
        id: i64,
        update: LinkUpdate,
    ) -> Result<LinkRecord, AppError> {
        let patch = LinkPatch {
            slug: update.slug.as_deref().map(normalize_slug).transpose()?,
            target_url: update
                .target_url
                .as_deref()
                .map(parse_target_url)
                .transpose()?,
        };

        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Nothing to update",
                json!({ "fields": ["slug", "target_url"] }),
            ));
        }

        let current = self.owned_link(owner_id, id).await?;

        let updated = self.store.update(id, patch).await?;

        self.invalidate(&current.slug).await;
        if updated.slug != current.slug {
            self.invalidate(&updated.slug).await;
        }

        info!(id, slug = %updated.slug, "Link updated");
        Ok(updated)
    }

    /// Deletes a link and frees its slug.
    pub async fn delete_link(&self, owner_id: &str, id: i64) -> Result<LinkRecord, AppError> {
        self.owned_link(owner_id, id).await?;

        let removed = self.store.delete(id).await?;
        self.invalidate(&removed.slug).await;

        info!(id, slug = %removed.slug, owner_id, "Link deleted");
        Ok(removed)
    }

    /// Lists the owner's links, newest first.
    pub async fn list_links(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        self.store.list_by_owner(owner_id).await
    }

    async fn owned_link(&self, owner_id: &str, id: i64) -> Result<LinkRecord, AppError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if !record.is_owned_by(owner_id) {
            return Err(AppError::forbidden(
                "Link belongs to another owner",
                json!({ "id": id }),
            ));
        }

        Ok(record)
    }

    async fn invalidate(&self, slug: &Slug) {
        if let Err(e) = self.cache.invalidate(slug.as_str()).await {
            warn!(slug = %slug, error = %e, "Cache invalidation failed");
        }
    }
}

fn parse_target_url(raw: &str) -> Result<String, AppError> {
    normalize_url(raw)
        .map_err(|e| AppError::invalid_url("Invalid target URL", json!({ "reason": e.to_string() })))
}
