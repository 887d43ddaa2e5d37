//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::LinkUpdate;
use crate::domain::entities::LinkRecord;

/// Request body for `POST /api/links`.
///
/// Slug rules are enforced by the service so that failures carry the
/// `invalid_slug` code; only size limits are checked here.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Requested slug. Absent or empty means "generate one".
    pub slug: Option<String>,

    #[validate(length(max = 2048, message = "target_url is too long"))]
    pub target_url: String,
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional, but at least one must be present.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    pub slug: Option<String>,

    #[validate(length(max = 2048, message = "target_url is too long"))]
    pub target_url: Option<String>,
}

impl From<UpdateLinkRequest> for LinkUpdate {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            slug: req.slug,
            target_url: req.target_url,
        }
    }
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub target_url: String,
    pub short_url: String,
    pub hit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(record: LinkRecord, short_url: String) -> Self {
        Self {
            id: record.id,
            slug: record.slug.into_inner(),
            target_url: record.target_url,
            short_url,
            hit_count: record.hit_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
