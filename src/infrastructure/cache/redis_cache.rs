//! Redis-backed resolution cache.

use super::service::{CacheError, CacheResult, CacheService, CachedLink};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, ExistenceCheck, SetExpiry, SetOptions, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Value stored in place of an entry after a rename, retarget or delete.
const TOMBSTONE: &str = "tombstone";

/// How long a tombstone blocks fills. Longer than any fill is expected to
/// stay in flight.
const TOMBSTONE_TTL_SECONDS: u64 = 60;

/// Redis cache for slug resolutions.
///
/// Values are JSON-encoded [`CachedLink`]s under `link:<slug>`. Connection
/// reuse goes through `ConnectionManager`. Fills use `SET NX EX` and
/// invalidations write a tombstone with `SET EX`, so a late fill cannot
/// replace an invalidation. Reads and fills are fail-open; invalidation
/// errors are returned.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// `default_ttl_seconds` applies when [`CacheService::set_if_absent`] is called
    /// without a TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        })
    }

    fn build_key(&self, slug: &str) -> String {
        format!("{}{}", self.key_prefix, slug)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, slug: &str) -> CacheResult<Option<CachedLink>> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(payload)) if payload == TOMBSTONE => {
                debug!(slug, "Cache TOMBSTONE");
                Ok(None)
            }
            Ok(Some(payload)) => match serde_json::from_str::<CachedLink>(&payload) {
                Ok(link) => {
                    debug!(slug, "Cache HIT");
                    Ok(Some(link))
                }
                Err(e) => {
                    warn!(slug, error = %e, "Discarding unreadable cache entry");
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(slug, "Cache MISS");
                Ok(None)
            }
            Err(e) => {
                error!(slug, error = %e, "Redis GET error");
                Ok(None)
            }
        }
    }

    async fn set_if_absent(
        &self,
        slug: &str,
        link: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<bool> {
        let key = self.build_key(slug);
        let payload = serde_json::to_string(link)?;
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl));
        let mut conn = self.client.clone();

        match conn
            .set_options::<_, _, Option<String>>(&key, payload, options)
            .await
        {
            Ok(Some(_)) => {
                debug!(slug, ttl, "Cache SET");
                Ok(true)
            }
            Ok(None) => {
                debug!(slug, "Cache SET skipped, key present");
                Ok(false)
            }
            Err(e) => {
                warn!(slug, error = %e, "Redis SET error");
                Ok(false)
            }
        }
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, TOMBSTONE, TOMBSTONE_TTL_SECONDS)
            .await
            .map_err(|e| CacheError::Operation(format!("Redis tombstone SET failed: {e}")))?;

        debug!(slug, "Cache INVALIDATE");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
