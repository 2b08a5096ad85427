//! Repository for the `project_recipients` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::recipient::{CreateRecipient, Recipient, UpdateRecipient};

const COLUMNS: &str = "id, project_id, email, name, is_primary, receive_notifications, \
                        created_at, updated_at";

/// Provides CRUD operations for project recipients.
pub struct RecipientRepo;

impl RecipientRepo {
    /// Add a recipient. The email is stored lowercased.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateRecipient,
    ) -> Result<Recipient, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_recipients (project_id, email, name, is_primary, receive_notifications)
             VALUES ($1, lower(trim($2)), $3, COALESCE($4, false), COALESCE($5, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(project_id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.is_primary)
            .bind(input.receive_notifications)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Recipient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_recipients WHERE id = $1");
        sqlx::query_as::<_, Recipient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a project's recipient by (already normalised) email.
    pub async fn find_by_email(
        pool: &PgPool,
        project_id: DbId,
        email: &str,
    ) -> Result<Option<Recipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_recipients
             WHERE project_id = $1 AND lower(email) = $2"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(project_id)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List a project's recipients, primary contact first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_recipients
             WHERE project_id = $1
             ORDER BY is_primary DESC, created_at ASC"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRecipient,
    ) -> Result<Option<Recipient>, sqlx::Error> {
        let query = format!(
            "UPDATE project_recipients SET
                email = COALESCE(lower(trim($2)), email),
                name = COALESCE($3, name),
                is_primary = COALESCE($4, is_primary),
                receive_notifications = COALESCE($5, receive_notifications)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.is_primary)
            .bind(input.receive_notifications)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_recipients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
