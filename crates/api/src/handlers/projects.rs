//! Handlers for the `/projects` resource: project CRUD, share settings,
//! share sessions, and recipients.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use cutroom_core::error::CoreError;
use cutroom_core::share::{
    generate_share_slug, normalize_email, otp_allowed, password_allowed, validate_auth_mode,
    validate_project_status, validate_share_slug,
};
use cutroom_core::types::DbId;
use cutroom_db::models::project::{CreateProject, Project, ShareSettings, UpdateProject};
use cutroom_db::models::recipient::{CreateRecipient, Recipient, UpdateRecipient};
use cutroom_db::models::share_session::ShareSession;
use cutroom_db::repositories::{
    ProjectRepo, RecipientRepo, ShareSessionRepo, VideoAssetRepo, VideoRepo,
};

use crate::auth::password::{hash_password, validate_password_strength, MIN_SHARE_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::handlers::admin::validate_email;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum length of a project title.
const MAX_TITLE_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListProjectsParams {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_company: Option<String>,
    /// Custom slug; a random one is generated when absent.
    pub share_slug: Option<String>,
}

/// Body of `PUT /projects/{id}/share`. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShareRequest {
    pub auth_mode: Option<String>,
    /// New share password. An empty string removes it.
    pub password: Option<String>,
    pub guest_mode: Option<bool>,
    pub guest_latest_only: Option<bool>,
    pub allow_asset_download: Option<bool>,
    pub share_slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevokedSessions {
    pub revoked: usize,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<ListProjectsParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    if let Some(status) = params.status.as_deref() {
        validate_project_status(status)?;
    }
    let projects = ProjectRepo::list(&state.pool, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let title = validate_title(&input.title)?;
    let share_slug = match input.share_slug {
        Some(slug) => {
            validate_share_slug(&slug)?;
            slug
        }
        None => generate_share_slug(),
    };

    let create = CreateProject {
        title,
        description: input.description,
        client_name: input.client_name,
        client_company: input.client_company,
        share_slug,
        created_by: Some(user.user_id),
    };
    let project = ProjectRepo::create(&state.pool, &create).await?;
    tracing::info!(project_id = project.id, user_id = user.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    if let Some(title) = &input.title {
        input.title = Some(validate_title(title)?);
    }
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the project with all of its rows and stored files.
pub async fn delete_project(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_project(&state, id).await?;

    let mut paths: Vec<String> = VideoRepo::list_by_project(&state.pool, id)
        .await?
        .into_iter()
        .map(|v| v.storage_path)
        .collect();
    paths.extend(VideoAssetRepo::storage_paths_for_project(&state.pool, id).await?);

    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Project", id));
    }
    state.share_sessions.invalidate_project(id);
    state.storage.remove_all(&paths).await;

    tracing::info!(project_id = id, user_id = user.user_id, files = paths.len(), "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Share settings and sessions
// ---------------------------------------------------------------------------

/// PUT /api/v1/projects/{id}/share
///
/// Changing the auth mode or the password revokes every share session.
pub async fn update_share_settings(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateShareRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, id).await?;
    let mut settings = ShareSettings::from_project(&project);
    let mut revoke_sessions = false;

    if let Some(mode) = input.auth_mode {
        validate_auth_mode(&mode)?;
        revoke_sessions |= mode != settings.auth_mode;
        settings.auth_mode = mode;
    }

    if let Some(password) = input.password {
        if password.is_empty() {
            settings.share_password_hash = None;
        } else {
            validate_password_strength(&password, MIN_SHARE_PASSWORD_LENGTH)
                .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
            let hashed = hash_password(&password)
                .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
            settings.share_password_hash = Some(hashed);
        }
        revoke_sessions = true;
    }

    if password_allowed(&settings.auth_mode) && settings.share_password_hash.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "A share password is required for this auth mode".into(),
        )));
    }

    if let Some(guest_mode) = input.guest_mode {
        settings.guest_mode = guest_mode;
    }
    if let Some(latest_only) = input.guest_latest_only {
        settings.guest_latest_only = latest_only;
    }
    if let Some(allow) = input.allow_asset_download {
        settings.allow_asset_download = allow;
    }
    if let Some(slug) = input.share_slug {
        validate_share_slug(&slug)?;
        settings.share_slug = slug;
    }

    if otp_allowed(&settings.auth_mode) {
        let recipients = RecipientRepo::list_by_project(&state.pool, id).await?;
        if recipients.is_empty() {
            tracing::warn!(project_id = id, "Code sign-in enabled with no recipients");
        }
    }

    let updated = ProjectRepo::update_share_settings(&state.pool, id, &settings)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    if revoke_sessions {
        let revoked = revoke_project_sessions(&state, id).await?;
        tracing::info!(
            project_id = id,
            user_id = user.user_id,
            revoked,
            "Share access changed, sessions revoked"
        );
    }

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/projects/{id}/share/regenerate-slug
///
/// Issues a new random slug; the old link stops working. Existing
/// sessions stay valid because they are bound to the project id.
pub async fn regenerate_slug(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, id).await?;
    let mut settings = ShareSettings::from_project(&project);
    settings.share_slug = generate_share_slug();
    let updated = ProjectRepo::update_share_settings(&state.pool, id, &settings)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/projects/{id}/share/sessions
pub async fn list_share_sessions(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ShareSession>>>> {
    find_project(&state, id).await?;
    let sessions = ShareSessionRepo::list_active_for_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// DELETE /api/v1/projects/{id}/share/sessions
pub async fn revoke_share_sessions(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RevokedSessions>>> {
    find_project(&state, id).await?;
    let revoked = revoke_project_sessions(&state, id).await?;
    tracing::info!(project_id = id, user_id = user.user_id, revoked, "Share sessions revoked");
    Ok(Json(DataResponse {
        data: RevokedSessions { revoked },
    }))
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/recipients
pub async fn list_recipients(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Recipient>>>> {
    find_project(&state, id).await?;
    let recipients = RecipientRepo::list_by_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: recipients }))
}

/// POST /api/v1/projects/{id}/recipients
pub async fn create_recipient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Json(mut input): Json<CreateRecipient>,
) -> AppResult<(StatusCode, Json<DataResponse<Recipient>>)> {
    find_project(&state, id).await?;
    validate_email(&input.email)?;
    input.email = normalize_email(&input.email);
    let recipient = RecipientRepo::create(&state.pool, id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recipient })))
}

/// PUT /api/v1/projects/{id}/recipients/{recipient_id}
pub async fn update_recipient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path((id, recipient_id)): Path<(DbId, DbId)>,
    Json(mut input): Json<UpdateRecipient>,
) -> AppResult<Json<DataResponse<Recipient>>> {
    find_recipient(&state, id, recipient_id).await?;
    if let Some(email) = &input.email {
        validate_email(email)?;
        input.email = Some(normalize_email(email));
    }
    let recipient = RecipientRepo::update(&state.pool, recipient_id, &input)
        .await?
        .ok_or(AppError::not_found("Recipient", recipient_id))?;
    Ok(Json(DataResponse { data: recipient }))
}

/// DELETE /api/v1/projects/{id}/recipients/{recipient_id}
///
/// Sessions the recipient opened with a code end immediately.
pub async fn delete_recipient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path((id, recipient_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_recipient(&state, id, recipient_id).await?;
    let hashes = ShareSessionRepo::revoke_for_recipient(&state.pool, recipient_id).await?;
    state.share_sessions.invalidate_many(&hashes);
    RecipientRepo::delete(&state.pool, recipient_id).await?;
    tracing::info!(project_id = id, recipient_id, revoked = hashes.len(), "Recipient removed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))
}

async fn find_recipient(state: &AppState, project_id: DbId, id: DbId) -> AppResult<Recipient> {
    RecipientRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|r| r.project_id == project_id)
        .ok_or(AppError::not_found("Recipient", id))
}

/// Revoke every share session of a project and drop them from the cache.
async fn revoke_project_sessions(state: &AppState, project_id: DbId) -> AppResult<usize> {
    let hashes = ShareSessionRepo::revoke_all_for_project(&state.pool, project_id).await?;
    state.share_sessions.invalidate_many(&hashes);
    state.share_sessions.invalidate_project(project_id);
    Ok(hashes.len())
}

fn validate_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Title must not be empty".into(),
        )));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        ))));
    }
    Ok(trimmed.to_string())
}
