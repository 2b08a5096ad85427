//! Route definitions for client share links and content streaming.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{content, share};
use crate::state::AppState;

/// Routes mounted at `/share/{slug}`.
///
/// Public entry points take only the slug; everything else requires a
/// share session token or a staff access token.
///
/// ```text
/// GET    /                            -> share_info
/// POST   /auth/password               -> password_login
/// POST   /auth/otp/request            -> request_otp
/// POST   /auth/otp/verify             -> verify_otp
/// POST   /auth/guest                  -> guest_login
/// DELETE /session                     -> end_session
///
/// GET    /videos                      -> list_videos
/// GET    /videos/{id}/assets          -> list_assets
/// POST   /videos/{id}/approve         -> approve_video
/// POST   /videos/{id}/content-token   -> video_content_token
/// POST   /assets/{id}/content-token   -> asset_content_token
///
/// GET    /comments                    -> list_comments (?video_id)
/// POST   /comments                    -> create_comment
/// DELETE /comments/{id}               -> delete_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(share::share_info))
        .route("/auth/password", post(share::password_login))
        .route("/auth/otp/request", post(share::request_otp))
        .route("/auth/otp/verify", post(share::verify_otp))
        .route("/auth/guest", post(share::guest_login))
        .route("/session", delete(share::end_session))
        .route("/videos", get(share::list_videos))
        .route("/videos/{id}/assets", get(share::list_assets))
        .route("/videos/{id}/approve", post(share::approve_video))
        .route("/videos/{id}/content-token", post(share::video_content_token))
        .route("/assets/{id}/content-token", post(share::asset_content_token))
        .route(
            "/comments",
            get(share::list_comments).post(share::create_comment),
        )
        .route("/comments/{id}", delete(share::delete_comment))
}

/// Routes mounted at `/content`.
///
/// The token in the path is the only credential.
///
/// ```text
/// GET /{token}  -> stream_content
/// ```
pub fn content_router() -> Router<AppState> {
    Router::new().route("/{token}", get(content::stream_content))
}
