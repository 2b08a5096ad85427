//! Staff bearer-token authentication.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cutroom_core::roles::{is_staff, ROLE_ADMIN};
use cutroom_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A signed-in staff member, taken from a staff access token.
///
/// Share and content tokens carry an audience and never decode as staff
/// tokens, so they are rejected here.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// `"admin"` or `"editor"`.
    pub role: String,
}

impl AuthUser {
    /// Decode a staff access token. `None` for anything else.
    pub fn from_token(token: &str, jwt: &JwtConfig) -> Option<Self> {
        let claims = validate_token(token, jwt).ok()?;
        Some(Self {
            user_id: claims.sub,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_staff(&self) -> bool {
        is_staff(&self.role)
    }
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    bearer_from_headers(&parts.headers)
}

pub fn bearer_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Err(AppError::unauthorized("Missing Authorization header"));
        }
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;
        AuthUser::from_token(token, &state.config.jwt)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))
    }
}
