//! HTTP server initialization and runtime setup.
//!
//! Builds the single shared store, the cache, and the hit worker, then runs
//! the Axum server until a shutdown signal arrives.

use crate::config::Config;
use crate::domain::hit_worker::{HitRecorder, run_hit_worker};
use crate::domain::repositories::LinkStore;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{MemoryLinkStore, PgLinkStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Link store (PostgreSQL with migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Background hit worker
/// - Axum HTTP server with graceful shutdown
///
/// On shutdown the router is dropped first, which closes the hit queue; the
/// worker then drains what is left before the store is closed.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = build_store(&config).await?;
    let cache = build_cache(&config).await;

    let (hit_recorder, hit_rx) = HitRecorder::channel(config.hit_queue_capacity);
    let worker = tokio::spawn(run_hit_worker(
        hit_rx,
        Arc::clone(&store),
        config.hit_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.hit_worker_concurrency,
        "Hit worker started"
    );

    let state = AppState::new(
        Arc::clone(&store),
        cache,
        hit_recorder,
        &config.base_url,
        config.slug_generation_attempts,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, draining hit queue");
    match worker.await {
        Ok(stats) => tracing::info!(
            applied = stats.applied,
            missed = stats.missed,
            dropped = stats.dropped,
            "Hit queue drained"
        ),
        Err(e) => tracing::error!(error = %e, "Hit worker panicked"),
    }

    store.close().await;
    tracing::info!("Store closed");

    Ok(())
}

/// Opens a PostgreSQL pool using the pool settings from `config`.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
pub async fn connect_pool(config: &Config, database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

async fn build_store(config: &Config) -> Result<Arc<dyn LinkStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("No database configured, links are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryLinkStore::new()));
    };

    let pool = connect_pool(config, database_url).await?;
    tracing::info!("Connected to database");

    let store = PgLinkStore::new(Arc::new(pool));
    store.migrate().await.context("Failed to apply migrations")?;
    tracing::info!("Migrations applied");

    Ok(Arc::new(store))
}

/// Connects the configured cache, falling back to [`NullCache`] when Redis is
/// absent or unreachable.
pub async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!(ttl = config.cache_ttl_seconds, "Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
