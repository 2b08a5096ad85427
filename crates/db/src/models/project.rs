//! Project model, share settings and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_company: Option<String>,
    pub share_slug: String,
    pub status: String,
    pub auth_mode: String,
    #[serde(skip_serializing)]
    pub share_password_hash: Option<String>,
    pub guest_mode: bool,
    pub guest_latest_only: bool,
    pub allow_asset_download: bool,
    pub approved_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn has_share_password(&self) -> bool {
        self.share_password_hash.is_some()
    }
}

/// DTO for creating a project. The slug is generated by the caller.
#[derive(Debug)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_company: Option<String>,
    pub share_slug: String,
    pub created_by: Option<DbId>,
}

/// DTO for updating project details. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_company: Option<String>,
    pub status: Option<String>,
}

/// Complete share configuration written in one statement.
#[derive(Debug, Clone)]
pub struct ShareSettings {
    pub auth_mode: String,
    pub share_password_hash: Option<String>,
    pub guest_mode: bool,
    pub guest_latest_only: bool,
    pub allow_asset_download: bool,
    pub share_slug: String,
}

impl ShareSettings {
    pub fn from_project(project: &Project) -> Self {
        Self {
            auth_mode: project.auth_mode.clone(),
            share_password_hash: project.share_password_hash.clone(),
            guest_mode: project.guest_mode,
            guest_latest_only: project.guest_latest_only,
            allow_asset_download: project.allow_asset_download,
            share_slug: project.share_slug.clone(),
        }
    }
}

/// Number of projects in one status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectStatusCount {
    pub status: String,
    pub count: i64,
}
