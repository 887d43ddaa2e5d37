//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Request Flow
///
/// 1. Normalize the slug (invalid slugs are simply not found)
/// 2. Check the resolution cache
/// 3. On a miss, read the store and fill the cache in the background
/// 4. Queue a hit for the background worker
/// 5. Return 307 Temporary Redirect
///
/// The response never waits for the hit counter.
///
/// # Errors
///
/// Returns 404 Not Found if no link holds the slug and 503 if the store is
/// unreachable.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match state.resolver.resolve(&slug).await? {
        Some(target_url) => Ok(Redirect::temporary(&target_url)),
        None => Err(AppError::not_found(
            "Short link not found",
            json!({ "slug": slug }),
        )),
    }
}
