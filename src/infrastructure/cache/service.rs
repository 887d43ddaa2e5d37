//! Cache service trait and error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(String),

    #[error("Cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// What the redirect path needs to answer without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLink {
    pub id: i64,
    pub target_url: String,
}

/// Cache of slug → target resolutions.
///
/// Implementations must be fail-open on reads: a broken cache degrades to
/// store lookups and never fails a request.
///
/// Writes follow a fill/tombstone protocol so that a fill racing a rename or
/// delete cannot resurrect the old mapping:
///
/// - [`CacheService::invalidate`] replaces the entry with a short-lived
///   tombstone. [`CacheService::get`] treats a tombstone as a miss.
/// - [`CacheService::set_if_absent`] only writes when the key holds nothing,
///   so it never overwrites a tombstone or a newer entry.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up the cached resolution for a normalized slug.
    ///
    /// Returns `Ok(None)` on a miss, on a tombstone and, in production
    /// implementations, on backend errors as well.
    async fn get(&self, slug: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a resolution unless the key already holds an entry or a
    /// tombstone. `ttl_seconds = None` uses the implementation default.
    ///
    /// Returns `true` if the entry was written.
    async fn set_if_absent(
        &self,
        slug: &str,
        link: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<bool>;

    /// Replaces the cached resolution for a slug with a tombstone.
    ///
    /// # Errors
    ///
    /// Unlike reads, a failed invalidation is reported so the caller can log
    /// that a stale entry may survive until its TTL.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;

    /// Short label for health reporting.
    fn backend_name(&self) -> &'static str;

    /// Whether entries are stored at all. Callers skip fill work when not.
    fn is_enabled(&self) -> bool {
        true
    }
}
