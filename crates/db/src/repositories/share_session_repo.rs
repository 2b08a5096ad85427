//! Repository for the `share_sessions` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::share_session::{CreateShareSession, ShareSession};

const COLUMNS: &str = "id, project_id, session_hash, access_method, recipient_id, display_name, \
    expires_at, is_revoked, ip_address, user_agent, last_seen_at, created_at";

/// Provides lifecycle operations for client share sessions.
pub struct ShareSessionRepo;

impl ShareSessionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateShareSession,
    ) -> Result<ShareSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO share_sessions
                (project_id, session_hash, access_method, recipient_id, display_name,
                 expires_at, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareSession>(&query)
            .bind(input.project_id)
            .bind(&input.session_hash)
            .bind(&input.access_method)
            .bind(input.recipient_id)
            .bind(&input.display_name)
            .bind(input.expires_at)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Find a live session for a project by its key hash and stamp
    /// `last_seen_at`.
    ///
    /// Returns `None` if the session is unknown, revoked, expired, or
    /// belongs to another project.
    pub async fn find_active_and_touch(
        pool: &PgPool,
        project_id: DbId,
        session_hash: &str,
    ) -> Result<Option<ShareSession>, sqlx::Error> {
        let query = format!(
            "UPDATE share_sessions SET last_seen_at = NOW()
             WHERE session_hash = $1
               AND project_id = $2
               AND is_revoked = false
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareSession>(&query)
            .bind(session_hash)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Active sessions for a project, most recently seen first.
    pub async fn list_active_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ShareSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM share_sessions
             WHERE project_id = $1 AND is_revoked = false AND expires_at > NOW()
             ORDER BY last_seen_at DESC"
        );
        sqlx::query_as::<_, ShareSession>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Revoke one session by key hash. Returns `true` if it was live.
    pub async fn revoke_by_hash(pool: &PgPool, session_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE share_sessions SET is_revoked = true
             WHERE session_hash = $1 AND is_revoked = false",
        )
        .bind(session_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every live session on a project, returning the revoked key
    /// hashes so caches can be invalidated.
    pub async fn revoke_all_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE share_sessions SET is_revoked = true
             WHERE project_id = $1 AND is_revoked = false
             RETURNING session_hash",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Revoke every live session opened by a recipient, returning the key
    /// hashes.
    pub async fn revoke_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE share_sessions SET is_revoked = true
             WHERE recipient_id = $1 AND is_revoked = false
             RETURNING session_hash",
        )
        .bind(recipient_id)
        .fetch_all(pool)
        .await
    }

    /// Delete expired or revoked sessions. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM share_sessions WHERE expires_at < NOW() OR is_revoked = true",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
