//! Handlers for the `/admin` resource (user management and settings).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use cutroom_core::error::CoreError;
use cutroom_core::roles::ROLE_ADMIN_ID;
use cutroom_core::sales::validate_fiscal_start_month;
use cutroom_core::types::DbId;
use cutroom_db::models::settings::{AppSettings, UpdateAppSettings};
use cutroom_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use cutroom_db::repositories::{RoleRepo, SettingsRepo, StaffSessionRepo, UserRepo};

use crate::auth::password::{hash_password, validate_password_strength, MIN_STAFF_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub role_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let username = input.username.trim();
    if username.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username must not be empty".into(),
        )));
    }
    validate_email(&input.email)?;
    validate_password_strength(&input.password, MIN_STAFF_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    ensure_role_exists(&state, input.role_id).await?;

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        username: username.to_string(),
        email: input.email.trim().to_string(),
        display_name: input.display_name,
        password_hash: hashed,
        role_id: input.role_id,
    };

    let user = UserRepo::create(&state.pool, &create_dto).await?;
    let response = user_to_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    let roles = RoleRepo::list(&state.pool).await?;

    let data = users
        .iter()
        .map(|u| {
            let role_name = roles
                .iter()
                .find(|r| r.id == u.role_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            UserResponse::from_user(u, role_name)
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    let response = user_to_response(&state, &user).await?;
    Ok(Json(DataResponse { data: response }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Admins cannot demote or deactivate themselves, and the last active
/// admin cannot lose the role.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let existing = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    if let Some(role_id) = input.role_id {
        ensure_role_exists(&state, role_id).await?;
    }

    let loses_admin = existing.role_id == ROLE_ADMIN_ID
        && (input.role_id.is_some_and(|r| r != ROLE_ADMIN_ID) || input.is_active == Some(false));
    if loses_admin {
        if admin.user_id == id {
            return Err(AppError::Core(CoreError::Conflict(
                "You cannot remove your own admin access".into(),
            )));
        }
        ensure_other_admin_remains(&state).await?;
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    if input.is_active == Some(false) {
        StaffSessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }

    let response = user_to_response(&state, &user).await?;
    Ok(Json(DataResponse { data: response }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivates the user and revokes their sessions.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot deactivate your own account".into(),
        )));
    }
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    if user.role_id == ROLE_ADMIN_ID && user.is_active {
        ensure_other_admin_remains(&state).await?;
    }

    UserRepo::deactivate(&state.pool, id).await?;
    StaffSessionRepo::revoke_all_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, by = admin.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password, MIN_STAFF_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &hashed).await? {
        return Err(AppError::not_found("User", id));
    }
    StaffSessionRepo::revoke_all_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<AppSettings>>> {
    let settings = SettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/admin/settings
///
/// Partial update. An empty `admin_notification_email` clears it.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UpdateAppSettings>,
) -> AppResult<Json<DataResponse<AppSettings>>> {
    if let Some(month) = input.fiscal_year_start_month {
        validate_fiscal_start_month(month)?;
    }
    if let Some(rate) = input.default_tax_rate_bps {
        if !(0..=10_000).contains(&rate) {
            return Err(AppError::Core(CoreError::Validation(
                "Tax rate must be between 0 and 10000 basis points".into(),
            )));
        }
    }
    if let Some(currency) = &input.default_currency {
        validate_currency(currency)?;
    }
    if let Some(email) = input.admin_notification_email.as_deref() {
        if !email.trim().is_empty() {
            validate_email(email)?;
        }
    }
    if let Some(name) = &input.company_name {
        if name.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Company name must not be empty".into(),
            )));
        }
    }

    let settings = SettingsRepo::update(&state.pool, &input).await?;
    Ok(Json(DataResponse { data: settings }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn user_to_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(UserResponse::from_user(user, role_name))
}

async fn ensure_role_exists(state: &AppState, role_id: DbId) -> AppResult<()> {
    RoleRepo::name_of(&state.pool, role_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Core(CoreError::Validation(format!("Unknown role id {role_id}"))))
}

async fn ensure_other_admin_remains(state: &AppState) -> AppResult<()> {
    let admins = UserRepo::count_active_with_role(&state.pool, ROLE_ADMIN_ID).await?;
    if admins <= 1 {
        return Err(AppError::Core(CoreError::Conflict(
            "At least one active admin is required".into(),
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@` with text on both sides and a dot in the domain.
pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        ))))
    }
}

/// Three-letter uppercase ISO 4217 style code.
pub(crate) fn validate_currency(code: &str) -> AppResult<()> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "Invalid currency code '{code}'. Use a three-letter code such as USD"
        ))))
    }
}
