pub mod admin;
pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod key_dates;
pub mod projects;
pub mod sales;
pub mod share;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree, excluding uploads
/// ([`videos::upload_router`]).
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current user
///
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                get, update, deactivate
/// /admin/users/{id}/reset-password                 reset password
/// /admin/settings                                  get, update (admin only)
///
/// /dashboard                                       overview (staff)
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/share                             update share settings
/// /projects/{id}/share/regenerate-slug             new share slug (POST)
/// /projects/{id}/share/sessions                    list, revoke all
/// /projects/{id}/recipients                        list, create
/// /projects/{id}/recipients/{recipient_id}         update, delete
/// /projects/{id}/videos                            list (grouped), upload
/// /projects/{id}/comments                          list, create
/// /projects/{id}/key-dates                         list, create
///
/// /videos/{id}                                     get, update, delete
/// /videos/{id}/approve                             approve (POST)
/// /videos/{id}/unapprove                           unapprove (POST)
/// /videos/{id}/content-token                       staff playback token
/// /videos/{id}/assets                              list, upload
/// /assets/{id}                                     delete
/// /assets/{id}/content-token                       staff download token
///
/// /comments/{id}                                   update, delete
/// /key-dates/{id}                                  update, delete
/// /calendar                                        key dates in range
///
/// /sales/clients, /sales/quotes, /sales/invoices   ledger CRUD (admin only)
/// /sales/quotes/{id}/convert                       quote -> invoice
/// /sales/invoices/{id}/payments                    list, record
/// /sales/payments/{id}                             delete
/// /sales/summary                                   fiscal-year rollup
///
/// /share/{slug}                                    client share link (see routes::share)
/// /content/{token}                                 token-scoped streaming
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Staff authentication.
        .nest("/auth", auth::router())
        // User management and settings.
        .nest("/admin", admin::router())
        .nest("/dashboard", dashboard::router())
        // Projects and everything scoped to one.
        .nest("/projects", projects::router())
        .nest("/videos", videos::router())
        .nest("/assets", videos::assets_router())
        .nest("/comments", comments::router())
        .nest("/key-dates", key_dates::router())
        .nest("/calendar", key_dates::calendar_router())
        // Sales ledger.
        .nest("/sales", sales::router())
        // Client-facing share links and streaming.
        .nest("/share/{slug}", share::router())
        .nest("/content", share::content_router())
}
