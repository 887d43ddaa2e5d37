//! API route configuration.
//!
//! Every route here extracts [`crate::api::middleware::OwnerId`] and
//! rejects requests without it.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, get_link_handler, list_links_handler,
    update_link_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Link management routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `POST   /links`       - Create a link (slug optional)
/// - `GET    /links`       - List the caller's links, newest first
/// - `GET    /links/{id}`  - Fetch one link
/// - `PATCH  /links/{id}`  - Rename and/or retarget a link
/// - `DELETE /links/{id}`  - Delete a link and free its slug
pub fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
}
