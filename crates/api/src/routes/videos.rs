//! Route definitions for the `/videos` and `/assets` resources.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

/// Routes mounted at `/videos`.
///
/// ```text
/// GET    /{id}                -> get_video
/// PUT    /{id}                -> update_video
/// DELETE /{id}                -> delete_video
/// POST   /{id}/approve        -> approve_video
/// POST   /{id}/unapprove      -> unapprove_video
/// POST   /{id}/content-token  -> video_content_token
/// GET    /{id}/assets         -> list_assets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(videos::get_video)
                .put(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/{id}/approve", post(videos::approve_video))
        .route("/{id}/unapprove", post(videos::unapprove_video))
        .route("/{id}/content-token", post(videos::video_content_token))
        .route("/{id}/assets", get(videos::list_assets))
}

/// Routes mounted at `/assets`.
///
/// ```text
/// DELETE /{id}                -> delete_asset
/// POST   /{id}/content-token  -> asset_content_token
/// ```
pub fn assets_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(videos::delete_asset))
        .route("/{id}/content-token", post(videos::asset_content_token))
}

/// Multipart upload routes, registered with full paths under `/api/v1`.
///
/// They skip the default body limit (storage enforces its own) and run
/// under the upload timeout instead of the request timeout.
///
/// ```text
/// POST /projects/{id}/videos  -> upload_video
/// POST /videos/{id}/assets    -> upload_asset
/// ```
pub fn upload_router() -> Router<AppState> {
    Router::new()
        .route("/projects/{id}/videos", post(videos::upload_video))
        .route("/videos/{id}/assets", post(videos::upload_asset))
        .layer(DefaultBodyLimit::disable())
}
