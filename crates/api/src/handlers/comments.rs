//! Handlers for comments (staff side).
//!
//! Staff see every comment including internal notes. Client-facing
//! comment routes live in [`crate::handlers::share`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use cutroom_core::review::{
    format_timecode, validate_comment_content, validate_timecode, AUTHOR_STAFF,
};
use cutroom_core::types::DbId;
use cutroom_db::models::comment::{Comment, CreateComment, UpdateComment};
use cutroom_db::models::video::Video;
use cutroom_db::repositories::{CommentRepo, UserRepo, VideoRepo};
use cutroom_events::bus::EVENT_COMMENT_CREATED;
use cutroom_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::projects::find_project;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub video_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct StaffCommentRequest {
    pub video_id: DbId,
    pub content: String,
    pub timecode_secs: Option<f64>,
    pub parent_id: Option<DbId>,
    #[serde(default)]
    pub is_internal: bool,
}

/// GET /api/v1/projects/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(project_id): Path<DbId>,
    Query(params): Query<CommentListParams>,
) -> AppResult<Json<DataResponse<Vec<Comment>>>> {
    find_project(&state, project_id).await?;
    let comments =
        CommentRepo::list_by_project(&state.pool, project_id, params.video_id, true).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/projects/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(project_id): Path<DbId>,
    Json(input): Json<StaffCommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Comment>>)> {
    find_project(&state, project_id).await?;
    let video = check_comment_target(
        &state,
        project_id,
        input.video_id,
        input.parent_id,
        input.timecode_secs,
        &input.content,
        true,
    )
    .await?;

    let author = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

    let create = CreateComment {
        project_id,
        video_id: video.id,
        parent_id: input.parent_id,
        timecode_secs: input.timecode_secs,
        content: input.content.trim().to_string(),
        author_kind: AUTHOR_STAFF.to_string(),
        user_id: Some(user.user_id),
        recipient_id: None,
        share_session_id: None,
        author_name: author.author_name().to_string(),
        author_email: Some(author.email.clone()),
        is_internal: input.is_internal,
    };
    let comment = CommentRepo::create(&state.pool, &create).await?;
    publish_comment_created(&state, &comment, &video);

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// PUT /api/v1/comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateComment>,
) -> AppResult<Json<DataResponse<Comment>>> {
    if let Some(content) = &input.content {
        validate_comment_content(content)?;
    }
    let comment = CommentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Comment", id))?;
    Ok(Json(DataResponse { data: comment }))
}

/// DELETE /api/v1/comments/{id}
///
/// Replies are removed with their parent.
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CommentRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Comment", id))
    }
}

// ---------------------------------------------------------------------------
// Shared with the share-link handlers
// ---------------------------------------------------------------------------

/// Validate a new comment's body and placement.
///
/// The video must belong to the project, the timecode must fall inside
/// the video, and a parent must be a comment on the same video. Internal
/// notes are reported missing unless `sees_internal` is set.
pub(crate) async fn check_comment_target(
    state: &AppState,
    project_id: DbId,
    video_id: DbId,
    parent_id: Option<DbId>,
    timecode_secs: Option<f64>,
    content: &str,
    sees_internal: bool,
) -> AppResult<Video> {
    validate_comment_content(content)?;

    let video = VideoRepo::find_in_project(&state.pool, project_id, video_id)
        .await?
        .ok_or(AppError::not_found("Video", video_id))?;

    if let Some(secs) = timecode_secs {
        validate_timecode(secs, video.duration_secs)?;
    }

    if let Some(parent_id) = parent_id {
        let parent = CommentRepo::find_by_id(&state.pool, parent_id)
            .await?
            .filter(|c| sees_internal || !c.is_internal)
            .ok_or(AppError::not_found("Comment", parent_id))?;
        if parent.video_id != video.id {
            return Err(AppError::BadRequest(
                "Replies must be on the same video as their parent".into(),
            ));
        }
    }

    Ok(video)
}

pub(crate) fn publish_comment_created(state: &AppState, comment: &Comment, video: &Video) {
    let event = PlatformEvent::new(EVENT_COMMENT_CREATED, comment.project_id)
        .with_source("comment", comment.id)
        .with_actor(comment.user_id, comment.author_name.clone())
        .with_payload(json!({
            "video_id": video.id,
            "video_name": video.name,
            "version": video.version,
            "parent_id": comment.parent_id,
            "is_internal": comment.is_internal,
            "timecode": comment.timecode_secs.map(format_timecode),
            "content": comment.content,
        }));
    state.event_bus.publish(event);
}
