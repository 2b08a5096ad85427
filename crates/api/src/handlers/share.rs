//! Client-facing share-link handlers (`/share/{slug}/...`).
//!
//! Authentication routes take a [`SharedProject`] and open share sessions.
//! Everything else takes [`ShareAccess`], which re-verifies the session on
//! every call.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use cutroom_core::error::CoreError;
use cutroom_core::hashing::{digests_match, hmac_sha256_hex};
use cutroom_core::review::{validate_author_name, AUTHOR_CLIENT, AUTHOR_STAFF};
use cutroom_core::share::{
    clients_can_interact, generate_otp, normalize_email, otp_allowed, otp_is_live,
    password_allowed, scope_for_access, validate_otp_format, ACCESS_GUEST, ACCESS_OPEN,
    ACCESS_OTP, ACCESS_PASSWORD, AUTH_MODE_NONE,
};
use cutroom_core::types::{DbId, Timestamp};
use cutroom_db::models::comment::{Comment, CreateComment};
use cutroom_db::models::project::Project;
use cutroom_db::models::share_otp::CreateShareOtp;
use cutroom_db::models::share_session::CreateShareSession;
use cutroom_db::models::video::{group_videos, Video, VideoGroup};
use cutroom_db::models::video_asset::VideoAsset;
use cutroom_db::repositories::{
    CommentRepo, RecipientRepo, SettingsRepo, ShareOtpRepo, ShareSessionRepo, UserRepo,
    VideoAssetRepo, VideoRepo,
};
use cutroom_events::templates::otp_email;

use crate::auth::jwt::{generate_opaque_token, generate_share_token, ShareTokenInput};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::handlers::admin::validate_email;
use crate::handlers::comments::{check_comment_target, publish_comment_created};
use crate::handlers::videos::{apply_approval, issue_content_token, ContentTokenResponse};
use crate::middleware::auth::bearer_from_headers;
use crate::middleware::client::ClientInfo;
use crate::rate_limit::{
    OPEN_SESSION_POLICY, OTP_REQUEST_POLICY, OTP_VERIFY_POLICY, SHARE_PASSWORD_POLICY,
};
use crate::response::DataResponse;
use crate::share::access::{ShareAccess, SharedProject};
use crate::share::cache::CachedShareSession;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// What an unauthenticated visitor may learn about a shared project.
#[derive(Debug, Serialize)]
pub struct ShareInfo {
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub status: String,
    pub auth_mode: String,
    pub password_required: bool,
    pub otp_available: bool,
    pub guest_available: bool,
    /// Whether comments and approvals are open.
    pub interactive: bool,
    pub allow_asset_download: bool,
    /// Issued immediately for projects that need no sign-in. Absent when
    /// the caller's own session is still live.
    pub session: Option<ShareSessionResponse>,
}

#[derive(Debug, Serialize)]
pub struct ShareSessionResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub access_method: String,
    pub scope: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordLoginRequest {
    pub password: String,
    /// Optional display name used on comments.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct OtpRequestResponse {
    pub message: &'static str,
    pub expires_in_mins: i64,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GuestRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShareCommentParams {
    pub video_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct ShareCommentRequest {
    pub video_id: DbId,
    pub content: String,
    pub timecode_secs: Option<f64>,
    pub parent_id: Option<DbId>,
    /// Used by sessions that carry no name of their own.
    pub author_name: Option<String>,
}

/// Shown whether or not the address belongs to a recipient.
const OTP_REQUEST_MESSAGE: &str = "If this address is on the project, a code is on its way";

// ---------------------------------------------------------------------------
// Entry and authentication
// ---------------------------------------------------------------------------

/// GET /api/v1/share/{slug}
///
/// Projects without sign-in get an `open` session here, unless the request
/// already carries a live session for the project.
pub async fn share_info(
    State(state): State<AppState>,
    SharedProject(project): SharedProject,
    client: ClientInfo,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<ShareInfo>>> {
    let session = if project.auth_mode == AUTH_MODE_NONE
        && !holds_live_session(&state, &project, &headers).await
    {
        state
            .rate_limiter
            .check(
                &format!("open:{}:{}", project.share_slug, client.ip),
                OPEN_SESSION_POLICY,
            )
            .map_err(|retry_after_secs| AppError::Core(CoreError::RateLimited { retry_after_secs }))?;
        Some(open_session(&state, &project, ACCESS_OPEN, None, None, &client).await?)
    } else {
        None
    };

    Ok(Json(DataResponse {
        data: ShareInfo {
            password_required: password_allowed(&project.auth_mode),
            otp_available: otp_allowed(&project.auth_mode),
            guest_available: project.guest_mode,
            interactive: clients_can_interact(&project.status),
            allow_asset_download: project.allow_asset_download,
            title: project.title,
            description: project.description,
            client_name: project.client_name,
            status: project.status,
            auth_mode: project.auth_mode,
            session,
        },
    }))
}

/// POST /api/v1/share/{slug}/auth/password
pub async fn password_login(
    State(state): State<AppState>,
    SharedProject(project): SharedProject,
    client: ClientInfo,
    Json(input): Json<PasswordLoginRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareSessionResponse>>)> {
    if !password_allowed(&project.auth_mode) {
        return Err(AppError::BadRequest(
            "This project does not use a password".into(),
        ));
    }

    let limit_key = format!("pw:{}:{}", project.share_slug, client.ip);
    state
        .rate_limiter
        .check(&limit_key, SHARE_PASSWORD_POLICY)
        .map_err(|retry_after_secs| {
            tracing::warn!(project_id = project.id, ip = %client.ip, "Share password rate limited");
            AppError::Core(CoreError::RateLimited { retry_after_secs })
        })?;

    let hash = project
        .share_password_hash
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("This project has no password set".into()))?;

    let valid = verify_password(&input.password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::warn!(project_id = project.id, ip = %client.ip, "Wrong share password");
        return Err(AppError::unauthorized("Incorrect password"));
    }

    state.rate_limiter.reset(&limit_key);
    let display_name = optional_name(input.name.as_deref())?;
    let session =
        open_session(&state, &project, ACCESS_PASSWORD, None, display_name, &client).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// POST /api/v1/share/{slug}/auth/otp/request
///
/// Answers the same way whether or not the email is a recipient.
pub async fn request_otp(
    State(state): State<AppState>,
    SharedProject(project): SharedProject,
    Json(input): Json<OtpRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OtpRequestResponse>>)> {
    if !otp_allowed(&project.auth_mode) {
        return Err(AppError::BadRequest(
            "This project does not use emailed codes".into(),
        ));
    }
    validate_email(&input.email)?;
    let email = normalize_email(&input.email);

    state
        .rate_limiter
        .check(&format!("otp:{}:{email}", project.share_slug), OTP_REQUEST_POLICY)
        .map_err(|retry_after_secs| AppError::Core(CoreError::RateLimited { retry_after_secs }))?;

    let expiry_mins = state.config.share.otp_expiry_mins;

    if let Some(recipient) = RecipientRepo::find_by_email(&state.pool, project.id, &email).await? {
        let code = generate_otp();
        let issued = ShareOtpRepo::issue(
            &state.pool,
            &CreateShareOtp {
                project_id: project.id,
                email: email.clone(),
                code_hash: otp_hash(&state, project.id, &email, &code),
                expires_at: Utc::now() + chrono::Duration::minutes(expiry_mins),
            },
        )
        .await?;

        let settings = SettingsRepo::get(&state.pool).await?;
        let mail = otp_email(
            &recipient.email,
            &settings.company_name,
            &project.title,
            &code,
            expiry_mins,
        );
        match state.mailer.send(mail).await {
            Ok(()) => tracing::info!(project_id = project.id, otp_id = issued.id, "Sign-in code sent"),
            Err(e) => tracing::error!(project_id = project.id, error = %e, "Failed to send sign-in code"),
        }
    } else {
        tracing::info!(project_id = project.id, "Sign-in code requested for unknown address");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: OtpRequestResponse {
                message: OTP_REQUEST_MESSAGE,
                expires_in_mins: expiry_mins,
            },
        }),
    ))
}

/// POST /api/v1/share/{slug}/auth/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    SharedProject(project): SharedProject,
    client: ClientInfo,
    Json(input): Json<OtpVerifyRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareSessionResponse>>)> {
    if !otp_allowed(&project.auth_mode) {
        return Err(AppError::BadRequest(
            "This project does not use emailed codes".into(),
        ));
    }
    let code = input.code.trim();
    validate_otp_format(code)?;
    let email = normalize_email(&input.email);

    state
        .rate_limiter
        .check(&format!("otpv:{}:{}", project.share_slug, client.ip), OTP_VERIFY_POLICY)
        .map_err(|retry_after_secs| AppError::Core(CoreError::RateLimited { retry_after_secs }))?;

    let invalid = || AppError::unauthorized("Invalid or expired code");

    let otp = ShareOtpRepo::find_latest_unconsumed(&state.pool, project.id, &email)
        .await?
        .ok_or_else(invalid)?;

    if !otp_is_live(otp.expires_at, otp.consumed_at, otp.attempts, Utc::now()) {
        tracing::info!(project_id = project.id, otp_id = otp.id, "Expired or exhausted code used");
        return Err(invalid());
    }

    let Some(attempts) = ShareOtpRepo::claim_attempt(&state.pool, otp.id).await? else {
        tracing::info!(project_id = project.id, otp_id = otp.id, "Code ran out of attempts");
        return Err(invalid());
    };

    if !digests_match(&otp.code_hash, &otp_hash(&state, project.id, &email, code)) {
        tracing::warn!(project_id = project.id, otp_id = otp.id, attempts, "Wrong sign-in code");
        return Err(invalid());
    }

    if !ShareOtpRepo::consume(&state.pool, otp.id).await? {
        return Err(invalid());
    }

    let recipient = RecipientRepo::find_by_email(&state.pool, project.id, &email)
        .await?
        .ok_or_else(invalid)?;

    let session = open_session(
        &state,
        &project,
        ACCESS_OTP,
        Some(recipient.id),
        Some(recipient.display_name().to_string()),
        &client,
    )
    .await?;
    tracing::info!(project_id = project.id, recipient_id = recipient.id, "Code verified");
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// POST /api/v1/share/{slug}/auth/guest
pub async fn guest_login(
    State(state): State<AppState>,
    SharedProject(project): SharedProject,
    client: ClientInfo,
    input: Option<Json<GuestRequest>>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareSessionResponse>>)> {
    if !project.guest_mode {
        return Err(AppError::forbidden("Guest access is not enabled for this project"));
    }
    let Json(input) = input.unwrap_or_default();
    let display_name = optional_name(input.name.as_deref())?;
    let session =
        open_session(&state, &project, ACCESS_GUEST, None, display_name, &client).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// DELETE /api/v1/share/{slug}/session
pub async fn end_session(
    State(state): State<AppState>,
    access: ShareAccess,
) -> AppResult<StatusCode> {
    if let Some(hash) = access.session_hash.as_deref() {
        ShareSessionRepo::revoke_by_hash(&state.pool, hash).await?;
        state.share_sessions.invalidate(hash);
        tracing::info!(project_id = access.project.id, session_id = ?access.session_id, "Share session ended");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Videos and assets
// ---------------------------------------------------------------------------

/// GET /api/v1/share/{slug}/videos
pub async fn list_videos(
    State(state): State<AppState>,
    access: ShareAccess,
) -> AppResult<Json<DataResponse<Vec<VideoGroup>>>> {
    let videos = if latest_only(&access) {
        VideoRepo::list_latest_by_project(&state.pool, access.project.id).await?
    } else {
        VideoRepo::list_by_project(&state.pool, access.project.id).await?
    };
    Ok(Json(DataResponse {
        data: group_videos(videos),
    }))
}

/// GET /api/v1/share/{slug}/videos/{id}/assets
pub async fn list_assets(
    State(state): State<AppState>,
    access: ShareAccess,
    Path((_slug, video_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Vec<VideoAsset>>>> {
    require_asset_access(&access)?;
    let video = visible_video(&state, &access, video_id).await?;
    let assets = VideoAssetRepo::list_by_video(&state.pool, video.id).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// POST /api/v1/share/{slug}/videos/{id}/content-token
pub async fn video_content_token(
    State(state): State<AppState>,
    access: ShareAccess,
    Path((_slug, video_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<ContentTokenResponse>>> {
    let video = visible_video(&state, &access, video_id).await?;
    let token = issue_content_token(&state, access.project.id, video.id, None)?;
    Ok(Json(DataResponse { data: token }))
}

/// POST /api/v1/share/{slug}/assets/{id}/content-token
pub async fn asset_content_token(
    State(state): State<AppState>,
    access: ShareAccess,
    Path((_slug, asset_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<ContentTokenResponse>>> {
    require_asset_access(&access)?;
    let (asset, project_id) = VideoAssetRepo::find_with_project(&state.pool, asset_id)
        .await?
        .filter(|(_, project_id)| *project_id == access.project.id)
        .ok_or(AppError::not_found("VideoAsset", asset_id))?;
    let token = issue_content_token(&state, project_id, asset.video_id, Some(asset.id))?;
    Ok(Json(DataResponse { data: token }))
}

/// POST /api/v1/share/{slug}/videos/{id}/approve
pub async fn approve_video(
    State(state): State<AppState>,
    access: ShareAccess,
    Path((_slug, video_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Video>>> {
    access.require_interactive()?;
    let video = VideoRepo::find_in_project(&state.pool, access.project.id, video_id)
        .await?
        .ok_or(AppError::not_found("Video", video_id))?;

    let (user_id, name) = actor_identity(&state, &access).await?;
    let approved = apply_approval(&state, &access.project, &video, user_id, &name).await?;
    Ok(Json(DataResponse { data: approved }))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// GET /api/v1/share/{slug}/comments
///
/// Internal staff notes are never returned here.
pub async fn list_comments(
    State(state): State<AppState>,
    access: ShareAccess,
    Query(params): Query<ShareCommentParams>,
) -> AppResult<Json<DataResponse<Vec<Comment>>>> {
    access.require_full()?;
    let comments =
        CommentRepo::list_by_project(&state.pool, access.project.id, params.video_id, false)
            .await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/share/{slug}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    access: ShareAccess,
    Json(input): Json<ShareCommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Comment>>)> {
    access.require_interactive()?;
    let video = check_comment_target(
        &state,
        access.project.id,
        input.video_id,
        input.parent_id,
        input.timecode_secs,
        &input.content,
        access.is_admin(),
    )
    .await?;

    let create = if let Some(user_id) = access.user_id {
        let user = UserRepo::find_by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
        CreateComment {
            project_id: access.project.id,
            video_id: video.id,
            parent_id: input.parent_id,
            timecode_secs: input.timecode_secs,
            content: input.content.trim().to_string(),
            author_kind: AUTHOR_STAFF.to_string(),
            user_id: Some(user_id),
            recipient_id: None,
            share_session_id: None,
            author_name: user.author_name().to_string(),
            author_email: Some(user.email.clone()),
            is_internal: false,
        }
    } else {
        let (author_name, author_email) = client_author(&state, &access, input.author_name.as_deref())
            .await?;
        CreateComment {
            project_id: access.project.id,
            video_id: video.id,
            parent_id: input.parent_id,
            timecode_secs: input.timecode_secs,
            content: input.content.trim().to_string(),
            author_kind: AUTHOR_CLIENT.to_string(),
            user_id: None,
            recipient_id: access.recipient_id,
            share_session_id: access.session_id,
            author_name,
            author_email,
            is_internal: false,
        }
    };

    let comment = CommentRepo::create(&state.pool, &create).await?;
    publish_comment_created(&state, &comment, &video);
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// DELETE /api/v1/share/{slug}/comments/{id}
///
/// Clients may delete their own comments: same recipient for code
/// sessions, same session otherwise.
pub async fn delete_comment(
    State(state): State<AppState>,
    access: ShareAccess,
    Path((_slug, comment_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    access.require_interactive()?;
    let comment = CommentRepo::find_by_id(&state.pool, comment_id)
        .await?
        .filter(|c| c.project_id == access.project.id && !c.is_internal)
        .ok_or(AppError::not_found("Comment", comment_id))?;

    let owns = access.is_admin()
        || match access.recipient_id {
            Some(rid) => comment.recipient_id == Some(rid),
            None => access.session_id.is_some() && comment.share_session_id == access.session_id,
        };
    if !owns {
        return Err(AppError::forbidden("You can only delete your own comments"));
    }

    CommentRepo::delete(&state.pool, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a share session row, cache it, and mint its token.
async fn open_session(
    state: &AppState,
    project: &Project,
    access_method: &str,
    recipient_id: Option<DbId>,
    display_name: Option<String>,
    client: &ClientInfo,
) -> AppResult<ShareSessionResponse> {
    let (session_key, session_hash) = generate_opaque_token();
    let expires_at = Utc::now() + chrono::Duration::hours(state.config.share.session_ttl_hours);
    let scope = scope_for_access(access_method);

    let session = ShareSessionRepo::create(
        &state.pool,
        &CreateShareSession {
            project_id: project.id,
            session_hash: session_hash.clone(),
            access_method: access_method.to_string(),
            recipient_id,
            display_name: display_name.clone(),
            expires_at,
            ip_address: Some(client.ip.clone()),
            user_agent: client.user_agent.clone(),
        },
    )
    .await?;

    let token = generate_share_token(
        &ShareTokenInput {
            project_id: project.id,
            session_key: &session_key,
            scope,
            method: access_method,
            recipient_id,
            expires_at: expires_at.timestamp(),
        },
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    state
        .share_sessions
        .insert(&session_hash, CachedShareSession::from(&session));

    tracing::info!(
        project_id = project.id,
        session_id = session.id,
        access_method,
        "Share session opened"
    );

    Ok(ShareSessionResponse {
        token,
        expires_at,
        access_method: access_method.to_string(),
        scope: scope.to_string(),
        display_name,
    })
}

/// Whether the request presents a live share session for `project`.
async fn holds_live_session(state: &AppState, project: &Project, headers: &HeaderMap) -> bool {
    let Some(token) = bearer_from_headers(headers) else {
        return false;
    };
    matches!(
        ShareAccess::from_share_token(state, project.clone(), token).await,
        Ok(Some(_))
    )
}

/// Keyed digest of a one-time code, bound to the project and address.
fn otp_hash(state: &AppState, project_id: DbId, email: &str, code: &str) -> String {
    hmac_sha256_hex(
        state.config.jwt.secret.as_bytes(),
        format!("{project_id}:{email}:{code}").as_bytes(),
    )
}

fn optional_name(name: Option<&str>) -> AppResult<Option<String>> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => Ok(Some(validate_author_name(n)?)),
        None => Ok(None),
    }
}

fn latest_only(access: &ShareAccess) -> bool {
    access.is_guest() && access.project.guest_latest_only
}

fn require_asset_access(access: &ShareAccess) -> AppResult<()> {
    access.require_full()?;
    if access.is_admin() || access.project.allow_asset_download {
        Ok(())
    } else {
        Err(AppError::forbidden("Downloads are disabled for this project"))
    }
}

/// A video of the shared project that this caller may see.
async fn visible_video(state: &AppState, access: &ShareAccess, video_id: DbId) -> AppResult<Video> {
    let video = VideoRepo::find_in_project(&state.pool, access.project.id, video_id)
        .await?
        .ok_or(AppError::not_found("Video", video_id))?;

    if latest_only(access) {
        let latest = VideoRepo::list_latest_by_project(&state.pool, access.project.id).await?;
        if !latest.iter().any(|v| v.id == video.id) {
            return Err(AppError::not_found("Video", video_id));
        }
    }
    Ok(video)
}

/// `(user_id, display name)` of whoever acts through this access.
async fn actor_identity(state: &AppState, access: &ShareAccess) -> AppResult<(Option<DbId>, String)> {
    if let Some(user_id) = access.user_id {
        let user = UserRepo::find_by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
        return Ok((Some(user_id), user.author_name().to_string()));
    }
    let (name, _) = client_author(state, access, None).await?;
    Ok((None, name))
}

/// Name and email recorded for a client action.
///
/// Code sessions use the recipient; other sessions use the name given at
/// sign-in, then the one supplied with the request.
async fn client_author(
    state: &AppState,
    access: &ShareAccess,
    supplied: Option<&str>,
) -> AppResult<(String, Option<String>)> {
    if let Some(recipient_id) = access.recipient_id {
        if let Some(recipient) = RecipientRepo::find_by_id(&state.pool, recipient_id).await? {
            return Ok((recipient.display_name().to_string(), Some(recipient.email.clone())));
        }
    }
    if let Some(name) = optional_name(supplied)? {
        return Ok((name, None));
    }
    if let Some(name) = access.display_name.clone() {
        return Ok((name, None));
    }
    Ok(("Client".to_string(), None))
}
