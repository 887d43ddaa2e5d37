//! Handlers for link management endpoints.
//!
//! Every endpoint here requires the [`OwnerId`] extractor; ownership rules
//! themselves live in [`crate::application::services::LinkService`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::api::middleware::OwnerId;
use crate::domain::entities::LinkRecord;
use crate::error::AppError;
use crate::state::AppState;

fn to_response(state: &AppState, record: LinkRecord) -> LinkResponse {
    let short_url = state.short_url(record.slug.as_str());
    LinkResponse::new(record, short_url)
}

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "slug": "spring-sale",          // optional, generated when absent
///   "target_url": "https://example.com/sale"
/// }
/// ```
///
/// # Errors
///
/// - 400 `invalid_slug` / `invalid_url` / `validation_error`
/// - 401 if `X-Owner-Id` is missing
/// - 409 if the slug is already claimed
pub async fn create_link_handler(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .create_link(&owner, payload.slug, &payload.target_url)
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&state, record))))
}

/// Lists the caller's links, newest first.
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let records = state.link_service.list_links(&owner).await?;

    Ok(Json(
        records
            .into_iter()
            .map(|record| to_response(&state, record))
            .collect(),
    ))
}

/// `GET /api/links/{id}`
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
) -> Result<Json<LinkResponse>, AppError> {
    let record = state.link_service.get_link(&owner, id).await?;
    Ok(Json(to_response(&state, record)))
}

/// Renames and/or retargets a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "slug": "new-name",                     // optional
///   "target_url": "https://example.com/new" // optional
/// }
/// ```
///
/// Both fields change together or not at all. Cached resolutions for the old
/// and new slug are dropped.
///
/// # Errors
///
/// - 400 if neither field is present or a field is invalid
/// - 403 if the link belongs to another owner
/// - 404 if the link does not exist
/// - 409 if the new slug is already claimed
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .update_link(&owner, id, payload.into())
        .await?;

    Ok(Json(to_response(&state, record)))
}

/// Deletes a link and frees its slug immediately.
///
/// `DELETE /api/links/{id}` → `204 No Content`
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
