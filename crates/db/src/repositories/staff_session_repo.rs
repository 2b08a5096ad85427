//! Repository for staff refresh sessions (`user_sessions`).
//!
//! A refresh token is single-use: [`StaffSessionRepo::claim_refresh_token`]
//! revokes the row in the same statement that reads it, so two concurrent
//! refreshes with one token cannot both succeed.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::staff_session::{NewStaffSession, StaffSession};

const COLUMNS: &str =
    "id, user_id, refresh_token_hash, expires_at, is_revoked, user_agent, ip_address, created_at";

pub struct StaffSessionRepo;

impl StaffSessionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewStaffSession<'_>,
    ) -> Result<StaffSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StaffSession>(&query)
            .bind(input.user_id)
            .bind(input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(input.user_agent)
            .bind(input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Revoke the live session holding this token hash and return it.
    /// `None` when the token is unknown, expired or already used.
    pub async fn claim_refresh_token(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<StaffSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = TRUE
             WHERE refresh_token_hash = $1 AND NOT is_revoked AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StaffSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Sign a user out everywhere. Returns how many live sessions ended.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = TRUE WHERE user_id = $1 AND NOT is_revoked",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions that can never be used again.
    pub async fn purge_dead(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE is_revoked OR expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
