//! Per-request share access verification.
//!
//! Every `/share/{slug}/...` route re-checks access on each call:
//!
//! 1. The slug must name a project that is not archived.
//! 2. A Bearer share token must belong to that project and its session must
//!    still be live (cache first, then `share_sessions`).
//! 3. Failing that, a staff access token grants admin access.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use cutroom_core::share::{
    clients_can_interact, is_shared, scope_for_access, ACCESS_ADMIN, ACCESS_GUEST, SCOPE_FULL,
};
use cutroom_core::types::DbId;
use cutroom_db::models::project::Project;
use cutroom_db::repositories::{ProjectRepo, ShareSessionRepo};

use crate::auth::jwt::{hash_token, validate_share_token};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::share::cache::CachedShareSession;
use crate::state::AppState;

/// The project behind a share slug, before any session check.
///
/// Unknown slugs are 404; archived projects are 403.
#[derive(Debug, Clone)]
pub struct SharedProject(pub Project);

impl FromRequestParts<AppState> for SharedProject {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let slug = params
            .get("slug")
            .ok_or_else(|| AppError::BadRequest("Missing share slug".into()))?;

        let project = ProjectRepo::find_by_slug(&state.pool, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("No project is shared at this link".into()))?;

        if !is_shared(&project.status) {
            return Err(AppError::forbidden("This project is no longer available"));
        }

        Ok(SharedProject(project))
    }
}

/// Verified access to a shared project.
#[derive(Debug, Clone)]
pub struct ShareAccess {
    pub project: Project,
    /// `open`, `password`, `otp`, `guest`, or `admin`.
    pub access_method: String,
    pub scope: &'static str,
    /// Share session row id (absent for staff).
    pub session_id: Option<DbId>,
    pub session_hash: Option<String>,
    pub recipient_id: Option<DbId>,
    pub display_name: Option<String>,
    /// Staff user id when accessed with a staff token.
    pub user_id: Option<DbId>,
}

impl ShareAccess {
    pub fn is_admin(&self) -> bool {
        self.access_method == ACCESS_ADMIN
    }

    pub fn is_guest(&self) -> bool {
        self.access_method == ACCESS_GUEST
    }

    /// Reject view-only sessions.
    pub fn require_full(&self) -> AppResult<()> {
        if self.scope == SCOPE_FULL {
            Ok(())
        } else {
            Err(AppError::forbidden("Guest access is view-only"))
        }
    }

    /// Reject callers who may not comment or approve on this project.
    pub fn require_interactive(&self) -> AppResult<()> {
        self.require_full()?;
        if clients_can_interact(&self.project.status) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Comments and approvals are closed for this project",
            ))
        }
    }

    fn from_session(project: Project, session_hash: String, session: CachedShareSession) -> Self {
        Self {
            project,
            scope: scope_for_access(&session.access_method),
            access_method: session.access_method,
            session_id: Some(session.session_id),
            session_hash: Some(session_hash),
            recipient_id: session.recipient_id,
            display_name: session.display_name,
            user_id: None,
        }
    }

    /// Verify `token` as a share token for `project`.
    ///
    /// `Ok(None)` when the token is not a share token at all. A share token
    /// for another project, or one whose session is gone, is an error.
    pub async fn from_share_token(
        state: &AppState,
        project: Project,
        token: &str,
    ) -> AppResult<Option<Self>> {
        let Ok(claims) = validate_share_token(token, &state.config.jwt) else {
            return Ok(None);
        };
        if claims.sub != project.id {
            return Err(AppError::unauthorized("Share session does not match this project"));
        }
        let session_hash = hash_token(&claims.sid);

        if let Some(cached) = state.share_sessions.get(&session_hash) {
            if cached.project_id == project.id {
                return Ok(Some(ShareAccess::from_session(project, session_hash, cached)));
            }
        }

        let generation = state.share_sessions.generation();
        let session =
            ShareSessionRepo::find_active_and_touch(&state.pool, project.id, &session_hash)
                .await?
                .ok_or_else(|| AppError::unauthorized("Share session expired or revoked"))?;

        let cached = CachedShareSession::from(&session);
        state
            .share_sessions
            .insert_loaded(&session_hash, cached.clone(), generation);
        Ok(Some(ShareAccess::from_session(project, session_hash, cached)))
    }
}

impl FromRequestParts<AppState> for ShareAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SharedProject(project) = SharedProject::from_request_parts(parts, state).await?;

        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("Share session required"))?;

        if let Some(access) = ShareAccess::from_share_token(state, project.clone(), token).await? {
            return Ok(access);
        }

        if let Some(user) = AuthUser::from_token(token, &state.config.jwt).filter(AuthUser::is_staff) {
            return Ok(ShareAccess {
                project,
                access_method: ACCESS_ADMIN.to_string(),
                scope: SCOPE_FULL,
                session_id: None,
                session_hash: None,
                recipient_id: None,
                display_name: None,
                user_id: Some(user.user_id),
            });
        }

        Err(AppError::unauthorized("Invalid or expired share session"))
    }
}
