//! Owner identity extraction.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::json;

use crate::error::AppError;

/// Header carrying the authenticated owner id.
///
/// Set by the authenticating proxy in front of the service; the id is
/// opaque here.
pub const OWNER_HEADER: &str = "x-owner-id";

const MAX_OWNER_ID_LEN: usize = 255;

/// The caller's owner id, taken from [`OWNER_HEADER`].
///
/// # Errors
///
/// Rejects with `401 Unauthorized` if the header is missing, blank, not
/// valid UTF-8, or longer than 255 bytes.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OwnerId(owner): OwnerId) -> String {
///     owner
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_OWNER_ID_LEN)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "X-Owner-Id header is missing or invalid" }),
                )
            })?;

        Ok(Self(owner.to_string()))
    }
}
