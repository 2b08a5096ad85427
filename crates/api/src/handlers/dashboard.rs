//! Handler for the staff dashboard overview.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use cutroom_db::models::comment::RecentComment;
use cutroom_db::models::project::ProjectStatusCount;
use cutroom_db::repositories::{CommentRepo, ProjectRepo, VideoRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_RECENT_COMMENTS: i64 = 10;
const MAX_RECENT_COMMENTS: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub recent_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardOverview {
    pub projects_by_status: Vec<ProjectStatusCount>,
    /// Video groups in projects under review with no approved version yet.
    pub groups_awaiting_approval: i64,
    pub recent_client_comments: Vec<RecentComment>,
}

/// GET /api/v1/dashboard
pub async fn overview(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<DashboardParams>,
) -> AppResult<Json<DataResponse<DashboardOverview>>> {
    let limit = params
        .recent_limit
        .unwrap_or(DEFAULT_RECENT_COMMENTS)
        .clamp(1, MAX_RECENT_COMMENTS);

    let (projects_by_status, groups_awaiting_approval, recent_client_comments) = tokio::try_join!(
        ProjectRepo::count_by_status(&state.pool),
        VideoRepo::count_groups_awaiting_approval(&state.pool),
        CommentRepo::recent_client_comments(&state.pool, limit),
    )?;

    Ok(Json(DataResponse {
        data: DashboardOverview {
            projects_by_status,
            groups_awaiting_approval,
            recent_client_comments,
        },
    }))
}
