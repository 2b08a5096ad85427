//! Staff sign-in: login, refresh-token rotation, logout and `/me`.
//!
//! Access tokens are short-lived JWTs. Refresh tokens are opaque, stored
//! hashed, and single-use.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use cutroom_db::models::staff_session::NewStaffSession;
use cutroom_db::models::user::{User, UserResponse};
use cutroom_db::repositories::{RoleRepo, StaffSessionRepo, UserRepo};

use crate::auth::jwt::{generate_access_token, generate_opaque_token, hash_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::response::DataResponse;
use crate::state::AppState;

/// Wrong passwords in a row before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

const LOCKOUT_MINS: i64 = 15;

const BAD_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let Some(user) = UserRepo::find_for_login(&state.pool, input.username.trim()).await? else {
        tracing::info!(ip = %client.ip, "Staff login for unknown account");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };
    ensure_can_sign_in(&user)?;
    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::forbidden(
            "Account is temporarily locked. Try again later.",
        ));
    }

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        let lock_until = Utc::now() + Duration::minutes(LOCKOUT_MINS);
        let locked =
            UserRepo::record_failed_login(&state.pool, user.id, MAX_FAILED_ATTEMPTS, lock_until)
                .await?;
        if locked {
            tracing::warn!(user_id = user.id, ip = %client.ip, "Account locked after failed logins");
        }
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, ip = %client.ip, "Staff login");
    Ok(Json(issue_tokens(&state, &user, &client).await?))
}

/// POST /api/v1/auth/refresh
///
/// Trades a refresh token for a new pair. The presented token is spent
/// whether or not the rest of the exchange succeeds.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let session = StaffSessionRepo::claim_refresh_token(&state.pool, &hash_token(&input.refresh_token))
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    ensure_can_sign_in(&user)?;

    Ok(Json(issue_tokens(&state, &user, &client).await?))
}

/// POST /api/v1/auth/logout
///
/// Ends every refresh session of the caller. Access tokens already issued
/// run out on their own.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = StaffSessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "Staff logout");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from_user(&user, role),
    }))
}

fn ensure_can_sign_in(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::forbidden("Account is deactivated"))
    }
}

/// Sign an access token and persist a fresh refresh session.
async fn issue_tokens(state: &AppState, user: &User, client: &ClientInfo) -> AppResult<TokenPair> {
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_token, refresh_hash) = generate_opaque_token();
    StaffSessionRepo::create(
        &state.pool,
        &NewStaffSession {
            user_id: user.id,
            refresh_token_hash: &refresh_hash,
            expires_at: Utc::now() + Duration::days(jwt.refresh_token_expiry_days),
            user_agent: client.user_agent.as_deref(),
            ip_address: &client.ip,
        },
    )
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: jwt.access_token_expiry_mins * 60,
        user: UserResponse::from_user(user, role),
    })
}
