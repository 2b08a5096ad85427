//! Handlers for videos, their versions, and attached assets (staff side).
//!
//! Uploads are multipart and streamed straight to storage. Uploading a
//! video under an existing name adds the next version to that group.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use cutroom_core::error::CoreError;
use cutroom_core::review::project_fully_approved;
use cutroom_core::share::{PROJECT_STATUS_APPROVED, PROJECT_STATUS_IN_REVIEW};
use cutroom_core::types::DbId;
use cutroom_core::uploads::{
    content_type_for, infer_asset_category, sanitize_file_name, validate_asset_category,
    validate_video_file_name,
};
use cutroom_db::models::project::Project;
use cutroom_db::models::video::{group_videos, CreateVideo, UpdateVideo, Video, VideoGroup};
use cutroom_db::models::video_asset::{CreateVideoAsset, VideoAsset};
use cutroom_db::repositories::{ProjectRepo, UserRepo, VideoAssetRepo, VideoRepo};
use cutroom_events::bus::{EVENT_PROJECT_APPROVED, EVENT_VIDEO_APPROVED, EVENT_VIDEO_UNAPPROVED};
use cutroom_events::PlatformEvent;

use crate::auth::jwt::generate_content_token;
use crate::error::{AppError, AppResult};
use crate::handlers::projects::find_project;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::Storage;

/// Maximum length of a video group name.
const MAX_VIDEO_NAME_LENGTH: usize = 200;

/// A freshly minted content token and the URL that streams with it.
#[derive(Debug, Serialize)]
pub struct ContentTokenResponse {
    pub token: String,
    pub url: String,
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/videos
///
/// Videos grouped by name, newest version first.
pub async fn list_videos(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<VideoGroup>>>> {
    find_project(&state, project_id).await?;
    let videos = VideoRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: group_videos(videos),
    }))
}

/// POST /api/v1/projects/{id}/videos
///
/// Multipart fields: `name` (group name, defaults to the file stem),
/// optional `version_label`, and `file`.
pub async fn upload_video(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(project_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Video>>)> {
    find_project(&state, project_id).await?;

    let mut name: Option<String> = None;
    let mut version_label: Option<String> = None;
    let mut stored: Option<(String, String, u64)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => name = Some(read_text(field).await?),
            "version_label" => version_label = Some(read_text(field).await?),
            "file" => {
                if stored.is_some() {
                    return Err(AppError::BadRequest("Only one file per upload".into()));
                }
                let file_name =
                    sanitize_file_name(field.file_name().unwrap_or(""), "upload.mp4");
                validate_video_file_name(&file_name)?;
                let relative = Storage::video_path(project_id, &file_name);
                let size = state.storage.write_field(&mut field, &relative).await?;
                stored = Some((file_name, relative, size));
            }
            _ => {}
        }
    }

    let (file_name, relative, size) =
        stored.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let group_name = match name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => file_stem(&file_name),
    };
    if group_name.chars().count() > MAX_VIDEO_NAME_LENGTH {
        state.storage.remove_all(&[relative]).await;
        return Err(AppError::Core(CoreError::Validation(format!(
            "Video name exceeds maximum length of {MAX_VIDEO_NAME_LENGTH} characters"
        ))));
    }

    let input = CreateVideo {
        project_id,
        name: group_name,
        version_label: version_label.filter(|l| !l.trim().is_empty()),
        mime_type: content_type_for(&file_name).to_string(),
        original_file_name: file_name,
        storage_path: relative.clone(),
        file_size_bytes: size as i64,
        uploaded_by: Some(user.user_id),
    };

    let video = match VideoRepo::create(&state.pool, &input).await {
        Ok(video) => video,
        Err(e) => {
            state.storage.remove_all(&[relative]).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        project_id,
        video_id = video.id,
        version = video.version,
        bytes = size,
        "Video uploaded"
    );

    // A new unapproved version can reopen a fully approved project.
    let project = find_project(&state, project_id).await?;
    let name = user_name(&state, user.user_id).await?;
    sync_project_status(&state, &project, Some(user.user_id), &name).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}

/// GET /api/v1/videos/{id}
pub async fn get_video(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Video>>> {
    let video = find_video(&state, id).await?;
    Ok(Json(DataResponse { data: video }))
}

/// PUT /api/v1/videos/{id}
///
/// Updates the label and player-reported metadata (duration, size).
pub async fn update_video(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVideo>,
) -> AppResult<Json<DataResponse<Video>>> {
    if let Some(duration) = input.duration_secs {
        if !duration.is_finite() || duration < 0.0 {
            return Err(AppError::Core(CoreError::Validation(
                "Duration must be a non-negative number of seconds".into(),
            )));
        }
    }
    if input.width.is_some_and(|w| w <= 0) || input.height.is_some_and(|h| h <= 0) {
        return Err(AppError::Core(CoreError::Validation(
            "Width and height must be positive".into(),
        )));
    }
    let video = VideoRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Video", id))?;
    Ok(Json(DataResponse { data: video }))
}

/// DELETE /api/v1/videos/{id}
///
/// Deletes the version with its assets and comments, then removes the
/// stored files.
pub async fn delete_video(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let video = find_video(&state, id).await?;

    let mut paths: Vec<String> = VideoAssetRepo::list_by_video(&state.pool, id)
        .await?
        .into_iter()
        .map(|a| a.storage_path)
        .collect();
    paths.push(video.storage_path.clone());

    if !VideoRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Video", id));
    }
    state.storage.remove_all(&paths).await;

    tracing::info!(video_id = id, project_id = video.project_id, files = paths.len(), "Video deleted");

    let project = find_project(&state, video.project_id).await?;
    let name = user_name(&state, user.user_id).await?;
    sync_project_status(&state, &project, Some(user.user_id), &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/videos/{id}/approve
pub async fn approve_video(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Video>>> {
    let video = find_video(&state, id).await?;
    let project = find_project(&state, video.project_id).await?;
    let name = user_name(&state, user.user_id).await?;
    let approved = apply_approval(&state, &project, &video, Some(user.user_id), &name).await?;
    Ok(Json(DataResponse { data: approved }))
}

/// POST /api/v1/videos/{id}/unapprove
pub async fn unapprove_video(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Video>>> {
    let video = find_video(&state, id).await?;
    let project = find_project(&state, video.project_id).await?;
    let name = user_name(&state, user.user_id).await?;

    let updated = VideoRepo::unapprove(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Video", id))?;

    if video.approved {
        state.event_bus.publish(
            PlatformEvent::new(EVENT_VIDEO_UNAPPROVED, project.id)
                .with_source("video", id)
                .with_actor(Some(user.user_id), name.clone())
                .with_payload(json!({ "video_name": updated.name, "version": updated.version })),
        );
    }

    sync_project_status(&state, &project, Some(user.user_id), &name).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/videos/{id}/content-token
pub async fn video_content_token(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ContentTokenResponse>>> {
    let video = find_video(&state, id).await?;
    let token = issue_content_token(&state, video.project_id, video.id, None)?;
    Ok(Json(DataResponse { data: token }))
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// GET /api/v1/videos/{id}/assets
pub async fn list_assets(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(video_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<VideoAsset>>>> {
    find_video(&state, video_id).await?;
    let assets = VideoAssetRepo::list_by_video(&state.pool, video_id).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// POST /api/v1/videos/{id}/assets
///
/// Multipart fields: `file` and optional `category` (inferred from the
/// extension when absent).
pub async fn upload_asset(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(video_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<VideoAsset>>)> {
    let video = find_video(&state, video_id).await?;

    let mut category: Option<String> = None;
    let mut stored: Option<(String, String, u64)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "category" => {
                let value = read_text(field).await?;
                validate_asset_category(&value)?;
                category = Some(value);
            }
            "file" => {
                if stored.is_some() {
                    return Err(AppError::BadRequest("Only one file per upload".into()));
                }
                let file_name = sanitize_file_name(field.file_name().unwrap_or(""), "asset.bin");
                let relative = Storage::asset_path(video.project_id, video_id, &file_name);
                let size = state.storage.write_field(&mut field, &relative).await?;
                stored = Some((file_name, relative, size));
            }
            _ => {}
        }
    }

    let (file_name, relative, size) =
        stored.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let input = CreateVideoAsset {
        video_id,
        category: category.unwrap_or_else(|| infer_asset_category(&file_name).to_string()),
        mime_type: content_type_for(&file_name).to_string(),
        file_name,
        storage_path: relative.clone(),
        file_size_bytes: size as i64,
    };

    match VideoAssetRepo::create(&state.pool, &input).await {
        Ok(asset) => Ok((StatusCode::CREATED, Json(DataResponse { data: asset }))),
        Err(e) => {
            state.storage.remove_all(&[relative]).await;
            Err(e.into())
        }
    }
}

/// DELETE /api/v1/assets/{id}
pub async fn delete_asset(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let asset = VideoAssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("VideoAsset", id))?;
    VideoAssetRepo::delete(&state.pool, id).await?;
    state.storage.remove_all(&[asset.storage_path]).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/assets/{id}/content-token
pub async fn asset_content_token(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ContentTokenResponse>>> {
    let (asset, project_id) = VideoAssetRepo::find_with_project(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("VideoAsset", id))?;
    let token = issue_content_token(&state, project_id, asset.video_id, Some(asset.id))?;
    Ok(Json(DataResponse { data: token }))
}

// ---------------------------------------------------------------------------
// Shared with the share-link handlers
// ---------------------------------------------------------------------------

/// Approve a version, clear its siblings, publish events, and roll the
/// project status forward.
pub(crate) async fn apply_approval(
    state: &AppState,
    project: &Project,
    video: &Video,
    actor_user_id: Option<DbId>,
    actor_name: &str,
) -> AppResult<Video> {
    let approved = VideoRepo::approve(&state.pool, video.id, actor_name)
        .await?
        .ok_or(AppError::not_found("Video", video.id))?;

    tracing::info!(
        project_id = project.id,
        video_id = video.id,
        version = approved.version,
        by_client = actor_user_id.is_none(),
        "Video approved"
    );

    state.event_bus.publish(
        PlatformEvent::new(EVENT_VIDEO_APPROVED, project.id)
            .with_source("video", video.id)
            .with_actor(actor_user_id, actor_name)
            .with_payload(json!({ "video_name": approved.name, "version": approved.version })),
    );

    sync_project_status(state, project, actor_user_id, actor_name).await?;
    Ok(approved)
}

/// Move the project between `in_review` and `approved` to match its
/// videos. Other statuses are left alone.
pub(crate) async fn sync_project_status(
    state: &AppState,
    project: &Project,
    actor_user_id: Option<DbId>,
    actor_name: &str,
) -> AppResult<()> {
    let rows = VideoRepo::approval_rows(&state.pool, project.id).await?;
    let fully_approved = project_fully_approved(rows.iter().map(|(n, a)| (n.as_str(), *a)));

    let current = ProjectRepo::find_by_id(&state.pool, project.id)
        .await?
        .map(|p| p.status)
        .unwrap_or_else(|| project.status.clone());

    if fully_approved && current == PROJECT_STATUS_IN_REVIEW {
        ProjectRepo::set_status(&state.pool, project.id, PROJECT_STATUS_APPROVED).await?;
        tracing::info!(project_id = project.id, "Project fully approved");
        state.event_bus.publish(
            PlatformEvent::new(EVENT_PROJECT_APPROVED, project.id)
                .with_actor(actor_user_id, actor_name),
        );
    } else if !fully_approved && current == PROJECT_STATUS_APPROVED {
        ProjectRepo::set_status(&state.pool, project.id, PROJECT_STATUS_IN_REVIEW).await?;
        tracing::info!(project_id = project.id, "Project reopened for review");
    }
    Ok(())
}

/// Mint a content token and the streaming URL for it.
pub(crate) fn issue_content_token(
    state: &AppState,
    project_id: DbId,
    video_id: DbId,
    asset_id: Option<DbId>,
) -> AppResult<ContentTokenResponse> {
    let ttl = state.config.share.content_token_ttl_secs;
    let token = generate_content_token(project_id, video_id, asset_id, ttl, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok(ContentTokenResponse {
        url: format!("/api/v1/content/{token}"),
        token,
        expires_in: ttl,
    })
}

pub(crate) async fn find_video(state: &AppState, id: DbId) -> AppResult<Video> {
    VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Video", id))
}

/// Display name of a staff member.
pub(crate) async fn user_name(state: &AppState, user_id: DbId) -> AppResult<String> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    Ok(user.author_name().to_string())
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn file_stem(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}
