//! Repository for the `videos` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::video::{CreateVideo, UpdateVideo, Video};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, version, version_label, original_file_name, \
    storage_path, file_size_bytes, mime_type, duration_secs, width, height, status, \
    approved, approved_at, approved_by_name, uploaded_by, created_at, updated_at";

/// Provides CRUD, versioning and approval operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new version, auto-assigning the next version number within
    /// the `(project, name)` group.
    ///
    /// The project row is locked while the number is picked, so concurrent
    /// uploads to one project get consecutive versions instead of colliding
    /// on the unique `(project_id, name, version)` key.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(input.project_id)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO videos
                (project_id, name, version, version_label, original_file_name,
                 storage_path, file_size_bytes, mime_type, uploaded_by)
             VALUES (
                $1, $2,
                (SELECT COALESCE(MAX(version), 0) + 1 FROM videos WHERE project_id = $1 AND name = $2),
                $3, $4, $5, $6, $7, $8
             )
             RETURNING {COLUMNS}"
        );
        let video = sqlx::query_as::<_, Video>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.version_label)
            .bind(&input.original_file_name)
            .bind(&input.storage_path)
            .bind(input.file_size_bytes)
            .bind(&input.mime_type)
            .bind(input.uploaded_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(video)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a video only if it belongs to `project_id`.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1 AND project_id = $2");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// All versions in a project, grouped by name with the newest version
    /// of each group first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos
             WHERE project_id = $1
             ORDER BY name ASC, version DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Only the newest version of each group.
    pub async fn list_latest_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (name) {COLUMNS} FROM videos
             WHERE project_id = $1
             ORDER BY name ASC, version DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update metadata. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                version_label = COALESCE($2, version_label),
                duration_secs = COALESCE($3, duration_secs),
                width = COALESCE($4, width),
                height = COALESCE($5, height)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.version_label)
            .bind(input.duration_secs)
            .bind(input.width)
            .bind(input.height)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a video. Assets and comments cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Approval ─────────────────────────────────────────────────────

    /// Mark a version approved and clear approval on the other versions of
    /// the same group. Uses a transaction to ensure atomicity.
    ///
    /// Returns `None` if the video does not exist.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approved_by_name: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE videos SET approved = false, approved_at = NULL, approved_by_name = NULL
             WHERE approved = true AND id <> $1
               AND (project_id, name) = (SELECT project_id, name FROM videos WHERE id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE videos SET approved = true, approved_at = NOW(), approved_by_name = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(approved_by_name)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Withdraw approval from a version.
    pub async fn unapprove(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET approved = false, approved_at = NULL, approved_by_name = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// `(name, approved)` for every version in a project.
    pub async fn approval_rows(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<(String, bool)>, sqlx::Error> {
        sqlx::query_as("SELECT name, approved FROM videos WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Number of video groups, across interactive projects, with no
    /// approved version.
    pub async fn count_groups_awaiting_approval(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM (
                SELECT v.project_id, v.name FROM videos v
                JOIN projects p ON p.id = v.project_id
                WHERE p.status = 'in_review'
                GROUP BY v.project_id, v.name
                HAVING NOT bool_or(v.approved)
             ) AS pending",
        )
        .fetch_one(pool)
        .await
    }
}
