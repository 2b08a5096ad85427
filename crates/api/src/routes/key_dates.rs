//! Route definitions for key dates and the calendar.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::key_dates;
use crate::state::AppState;

/// Routes mounted at `/key-dates`.
///
/// ```text
/// PUT    /{id}  -> update_key_date
/// DELETE /{id}  -> delete_key_date
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        put(key_dates::update_key_date).delete(key_dates::delete_key_date),
    )
}

/// Routes mounted at `/calendar`.
///
/// ```text
/// GET /  -> calendar (?from, to)
/// ```
pub fn calendar_router() -> Router<AppState> {
    Router::new().route("/", get(key_dates::calendar))
}
