//! Staff sign-in routes, mounted at `/auth`.
//!
//! Client share links authenticate under `/share/{slug}/auth` instead.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// POST /login    username or email + password -> token pair
/// POST /refresh  single-use refresh token     -> token pair
/// POST /logout   bearer                       -> revoke refresh sessions
/// GET  /me       bearer                       -> current user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
