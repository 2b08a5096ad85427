//! Video version model and DTOs.
//!
//! Videos sharing a `name` within a project form a group; each upload
//! into the group gets the next `version` number.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub version: i32,
    pub version_label: Option<String>,
    pub original_file_name: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub duration_secs: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub status: String,
    pub approved: bool,
    pub approved_at: Option<Timestamp>,
    pub approved_by_name: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new version. The version number is assigned by
/// the repository.
#[derive(Debug)]
pub struct CreateVideo {
    pub project_id: DbId,
    pub name: String,
    pub version_label: Option<String>,
    pub original_file_name: String,
    pub storage_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub uploaded_by: Option<DbId>,
}

/// DTO for updating video metadata. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVideo {
    pub version_label: Option<String>,
    pub duration_secs: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Versions of one video name, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct VideoGroup {
    pub name: String,
    pub approved: bool,
    pub versions: Vec<Video>,
}

/// Group an ordered list (name ASC, version DESC) into [`VideoGroup`]s.
pub fn group_videos(videos: Vec<Video>) -> Vec<VideoGroup> {
    let mut groups: Vec<VideoGroup> = Vec::new();
    for video in videos {
        match groups.last_mut() {
            Some(group) if group.name == video.name => {
                group.approved |= video.approved;
                group.versions.push(video);
            }
            _ => groups.push(VideoGroup {
                name: video.name.clone(),
                approved: video.approved,
                versions: vec![video],
            }),
        }
    }
    groups
}
