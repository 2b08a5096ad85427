//! Repository for the `projects` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::project::{
    CreateProject, Project, ProjectStatusCount, ShareSettings, UpdateProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, client_name, client_company, share_slug, \
    status, auth_mode, share_password_hash, guest_mode, guest_latest_only, \
    allow_asset_download, approved_at, created_by, created_at, updated_at";

/// Provides CRUD and share configuration for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project with default share settings.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (title, description, client_name, client_company, share_slug, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.client_name)
            .bind(&input.client_company)
            .bind(&input.share_slug)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a share link.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE share_slug = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List projects, newest first, optionally filtered by status.
    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Update project details. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                client_name = COALESCE($4, client_name),
                client_company = COALESCE($5, client_company),
                status = COALESCE($6, status),
                approved_at = CASE
                    WHEN $6 = 'approved' AND status <> 'approved' THEN NOW()
                    WHEN $6 IS NOT NULL AND $6 <> 'approved' THEN NULL
                    ELSE approved_at
                END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.client_name)
            .bind(&input.client_company)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Move a project to `status`, stamping `approved_at` on approval.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        Self::update(
            pool,
            id,
            &UpdateProject {
                status: Some(status.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Overwrite the whole share configuration.
    pub async fn update_share_settings(
        pool: &PgPool,
        id: DbId,
        settings: &ShareSettings,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                auth_mode = $2,
                share_password_hash = $3,
                guest_mode = $4,
                guest_latest_only = $5,
                allow_asset_download = $6,
                share_slug = $7
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&settings.auth_mode)
            .bind(&settings.share_password_hash)
            .bind(settings.guest_mode)
            .bind(settings.guest_latest_only)
            .bind(settings.allow_asset_download)
            .bind(&settings.share_slug)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project and everything hanging off it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Project counts grouped by status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<ProjectStatusCount>, sqlx::Error> {
        sqlx::query_as::<_, ProjectStatusCount>(
            "SELECT status, COUNT(*) AS count FROM projects GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }
}
