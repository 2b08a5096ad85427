//! Timestamped review comment model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub project_id: DbId,
    pub video_id: DbId,
    pub parent_id: Option<DbId>,
    pub timecode_secs: Option<f64>,
    pub content: String,
    /// `"staff"` or `"client"`.
    pub author_kind: String,
    pub user_id: Option<DbId>,
    pub recipient_id: Option<DbId>,
    #[serde(skip_serializing)]
    pub share_session_id: Option<DbId>,
    pub author_name: String,
    #[serde(skip_serializing)]
    pub author_email: Option<String>,
    pub is_internal: bool,
    pub is_resolved: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a comment.
#[derive(Debug)]
pub struct CreateComment {
    pub project_id: DbId,
    pub video_id: DbId,
    pub parent_id: Option<DbId>,
    pub timecode_secs: Option<f64>,
    pub content: String,
    pub author_kind: String,
    pub user_id: Option<DbId>,
    pub recipient_id: Option<DbId>,
    pub share_session_id: Option<DbId>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub is_internal: bool,
}

/// DTO for staff edits. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateComment {
    pub content: Option<String>,
    pub is_resolved: Option<bool>,
    pub is_internal: Option<bool>,
}

/// Recent client comment joined with its project, for the dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentComment {
    pub id: DbId,
    pub project_id: DbId,
    pub project_title: String,
    pub video_id: DbId,
    pub video_name: String,
    pub author_name: String,
    pub content: String,
    pub timecode_secs: Option<f64>,
    pub created_at: Timestamp,
}
