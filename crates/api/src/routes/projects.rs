//! Route definitions for the `/projects` resource and its children.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{comments, key_dates, projects, videos};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// Staff only. The upload route for `/{id}/videos` is registered by
/// [`super::videos::upload_router`].
///
/// ```text
/// GET    /                                  -> list_projects (?status)
/// POST   /                                  -> create_project
/// GET    /{id}                              -> get_project
/// PUT    /{id}                              -> update_project
/// DELETE /{id}                              -> delete_project
///
/// PUT    /{id}/share                        -> update_share_settings
/// POST   /{id}/share/regenerate-slug        -> regenerate_slug
/// GET    /{id}/share/sessions               -> list_share_sessions
/// DELETE /{id}/share/sessions               -> revoke_share_sessions
///
/// GET    /{id}/recipients                   -> list_recipients
/// POST   /{id}/recipients                   -> create_recipient
/// PUT    /{id}/recipients/{recipient_id}    -> update_recipient
/// DELETE /{id}/recipients/{recipient_id}    -> delete_recipient
///
/// GET    /{id}/videos                       -> list_videos
///
/// GET    /{id}/comments                     -> list_comments (?video_id)
/// POST   /{id}/comments                     -> create_comment
///
/// GET    /{id}/key-dates                    -> list_key_dates
/// POST   /{id}/key-dates                    -> create_key_date
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/{id}/share", put(projects::update_share_settings))
        .route(
            "/{id}/share/regenerate-slug",
            post(projects::regenerate_slug),
        )
        .route(
            "/{id}/share/sessions",
            get(projects::list_share_sessions).delete(projects::revoke_share_sessions),
        )
        .route(
            "/{id}/recipients",
            get(projects::list_recipients).post(projects::create_recipient),
        )
        .route(
            "/{id}/recipients/{recipient_id}",
            put(projects::update_recipient).delete(projects::delete_recipient),
        )
        .route("/{id}/videos", get(videos::list_videos))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{id}/key-dates",
            get(key_dates::list_key_dates).post(key_dates::create_key_date),
        )
}
