//! PostgreSQL implementation of the link store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::domain::entities::{LinkPatch, LinkRecord, NewLink};
use crate::domain::repositories::{LinkStore, StoreStats};
use crate::error::AppError;
use crate::utils::slug::Slug;

const LINK_COLUMNS: &str = "id, owner_id, slug, target_url, hit_count, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    owner_id: String,
    slug: String,
    target_url: String,
    hit_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for LinkRecord {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            slug: Slug::from_stored(row.slug),
            target_url: row.target_url,
            hit_count: row.hit_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed link store.
///
/// Slug uniqueness is the `links_slug_key` constraint, so every claim (insert
/// or rename) is one statement that either commits or raises a unique
/// violation. Hit counts are bumped in place with `hit_count = hit_count + 1`.
pub struct PgLinkStore {
    pool: Arc<PgPool>,
}

impl PgLinkStore {
    /// Creates a store on top of an existing connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `./migrations`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| AppError::internal("Migration failed", json!({ "reason": e.to_string() })))
    }
}

/// Maps a failed claim to a conflict naming the slug.
fn claim_error(e: sqlx::Error, slug: &Slug) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict("Slug is already claimed", json!({ "slug": slug }));
    }
    e.into()
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

#[async_trait]
impl LinkStore for PgLinkStore {
    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        let sql = format!(
            "INSERT INTO links (owner_id, slug, target_url) VALUES ($1, $2, $3) RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.owner_id)
            .bind(new_link.slug.as_str())
            .bind(&new_link.target_url)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| claim_error(e, &new_link.slug))?;

        Ok(row.into())
    }

    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<LinkRecord>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn increment_hit(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE links SET hit_count = hit_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET slug = COALESCE($2, slug),
                target_url = COALESCE($3, target_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(patch.slug.as_ref().map(Slug::as_str))
            .bind(patch.target_url.as_deref())
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| match &patch.slug {
                Some(slug) => claim_error(e, slug),
                None => e.into(),
            })?;

        row.map(Into::into).ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<LinkRecord, AppError> {
        let sql = format!("DELETE FROM links WHERE id = $1 RETURNING {LINK_COLUMNS}");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Into::into).ok_or_else(|| not_found(id))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        let (links, hits) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(hit_count), 0)::BIGINT FROM links",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(StoreStats { links, hits })
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
