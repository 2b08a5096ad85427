//! Role gates for staff routes.
//!
//! `RequireAdmin` guards users, settings and the sales ledger.
//! `RequireStaff` (admin or editor) guards project work.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub struct RequireAdmin(pub AuthUser);

pub struct RequireStaff(pub AuthUser);

/// Authenticate, then reject with 403 unless `allowed` holds.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(&AuthUser) -> bool,
    denial: &str,
) -> AppResult<AuthUser> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if allowed(&user) {
        Ok(user)
    } else {
        tracing::debug!(user_id = user.user_id, role = %user.role, "Role check failed");
        Err(AppError::forbidden(denial))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        authorize(parts, state, AuthUser::is_admin, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        authorize(parts, state, AuthUser::is_staff, "Staff role required")
            .await
            .map(RequireStaff)
    }
}
