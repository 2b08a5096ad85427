//! Repository for the `comments` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::comment::{Comment, CreateComment, RecentComment, UpdateComment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, video_id, parent_id, timecode_secs, content, \
    author_kind, user_id, recipient_id, share_session_id, author_name, author_email, \
    is_internal, is_resolved, created_at, updated_at";

/// Provides CRUD operations for review comments.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments
                (project_id, video_id, parent_id, timecode_secs, content, author_kind,
                 user_id, recipient_id, share_session_id, author_name, author_email, is_internal)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.project_id)
            .bind(input.video_id)
            .bind(input.parent_id)
            .bind(input.timecode_secs)
            .bind(&input.content)
            .bind(&input.author_kind)
            .bind(input.user_id)
            .bind(input.recipient_id)
            .bind(input.share_session_id)
            .bind(&input.author_name)
            .bind(&input.author_email)
            .bind(input.is_internal)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's comments ordered by video, timecode, then creation.
    ///
    /// Internal staff notes are only included when `include_internal` is set.
    /// `video_id` narrows the list to a single video.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        video_id: Option<DbId>,
        include_internal: bool,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE project_id = $1
               AND ($2::BIGINT IS NULL OR video_id = $2)
               AND ($3 OR is_internal = false)
             ORDER BY video_id, timecode_secs NULLS FIRST, created_at ASC"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(project_id)
            .bind(video_id)
            .bind(include_internal)
            .fetch_all(pool)
            .await
    }

    /// Update a comment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateComment,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET
                content = COALESCE($2, content),
                is_resolved = COALESCE($3, is_resolved),
                is_internal = COALESCE($4, is_internal)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(&input.content)
            .bind(input.is_resolved)
            .bind(input.is_internal)
            .fetch_optional(pool)
            .await
    }

    /// Delete a comment and its replies.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent client comments across all projects.
    pub async fn recent_client_comments(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<RecentComment>, sqlx::Error> {
        sqlx::query_as::<_, RecentComment>(
            "SELECT c.id, c.project_id, p.title AS project_title, c.video_id,
                    v.name AS video_name, c.author_name, c.content, c.timecode_secs, c.created_at
             FROM comments c
             JOIN projects p ON p.id = c.project_id
             JOIN videos v ON v.id = c.video_id
             WHERE c.author_kind = 'client'
             ORDER BY c.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
