//! Store trait for link records.

use crate::domain::entities::{LinkPatch, LinkRecord, NewLink};
use crate::error::AppError;
use crate::utils::slug::Slug;
use async_trait::async_trait;

/// Totals across every owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub links: i64,
    pub hits: i64,
}

/// Durable, uniqueness-enforcing storage for link records.
///
/// The slug is the primary lookup key and is unique across live records.
/// Every mutating method is a single atomic operation against the backend:
/// callers never compose a read with a later write to enforce uniqueness.
///
/// The store knows nothing about ownership; authorization happens in
/// [`crate::application::services::LinkService`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkStore`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryLinkStore`] - In-process
/// - Test mocks available with `cfg(test)`
///
/// # Errors
///
/// Any method may return [`AppError::Unavailable`] when the backend cannot be
/// reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Claims `new_link.slug` and inserts the record with `hit_count = 0`.
    ///
    /// Two concurrent inserts of the same slug yield exactly one success.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is held by a live record.
    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError>;

    /// Finds the live record holding `slug`.
    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<LinkRecord>, AppError>;

    /// Finds a live record by id.
    async fn get_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError>;

    /// Adds one to the record's hit counter without touching `updated_at`.
    ///
    /// Concurrent increments on the same id are never lost.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist (including
    /// when it was deleted concurrently).
    async fn increment_hit(&self, id: i64) -> Result<(), AppError>;

    /// Applies a metadata change and bumps `updated_at`.
    ///
    /// When `patch.slug` is set, releasing the old slug and claiming the new
    /// one happen together: on conflict the record keeps its old slug and
    /// nothing else in the patch is applied.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has `id`.
    /// Returns [`AppError::Conflict`] if the new slug belongs to another record.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError>;

    /// Moves the record to `new_slug`. See [`LinkStore::update`].
    async fn rename_slug(&self, id: i64, new_slug: &Slug) -> Result<LinkRecord, AppError> {
        self.update(id, LinkPatch::rename(new_slug.clone())).await
    }

    /// Removes the record and frees its slug in one step.
    ///
    /// Returns the record as it was at removal.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has `id`.
    async fn delete(&self, id: i64) -> Result<LinkRecord, AppError>;

    /// Lists one owner's records, most recently created first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError>;

    /// Counts records and hits across all owners.
    async fn stats(&self) -> Result<StoreStats, AppError>;

    /// Returns true if the backend answers.
    async fn health_check(&self) -> bool;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self) {}
}
