//! Repository for the `share_otps` table.

use sqlx::PgPool;
use cutroom_core::share::MAX_OTP_ATTEMPTS;
use cutroom_core::types::DbId;

use crate::models::share_otp::{CreateShareOtp, ShareOtp};

const COLUMNS: &str = "id, project_id, email, code_hash, attempts, expires_at, consumed_at, created_at";

/// Provides issue/redeem operations for one-time codes.
pub struct ShareOtpRepo;

impl ShareOtpRepo {
    /// Store a new code, invalidating any unconsumed codes previously sent
    /// to the same address for the same project.
    pub async fn issue(pool: &PgPool, input: &CreateShareOtp) -> Result<ShareOtp, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE share_otps SET consumed_at = NOW()
             WHERE project_id = $1 AND email = $2 AND consumed_at IS NULL",
        )
        .bind(input.project_id)
        .bind(&input.email)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO share_otps (project_id, email, code_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let otp = sqlx::query_as::<_, ShareOtp>(&query)
            .bind(input.project_id)
            .bind(&input.email)
            .bind(&input.code_hash)
            .bind(input.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(otp)
    }

    /// The newest unconsumed code for an address, live or not.
    pub async fn find_latest_unconsumed(
        pool: &PgPool,
        project_id: DbId,
        email: &str,
    ) -> Result<Option<ShareOtp>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM share_otps
             WHERE project_id = $1 AND email = $2 AND consumed_at IS NULL
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ShareOtp>(&query)
            .bind(project_id)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Spend one attempt on a live code before the guess is compared.
    ///
    /// Returns the new attempt count, or `None` if the code is consumed,
    /// expired, or already out of attempts. Concurrent guesses each take
    /// their own attempt, so no more than [`MAX_OTP_ATTEMPTS`] are ever
    /// compared.
    pub async fn claim_attempt(pool: &PgPool, id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE share_otps SET attempts = attempts + 1
             WHERE id = $1
               AND consumed_at IS NULL
               AND attempts < $2
               AND expires_at > NOW()
             RETURNING attempts",
        )
        .bind(id)
        .bind(MAX_OTP_ATTEMPTS)
        .fetch_optional(pool)
        .await
    }

    /// Mark a code used after a matching guess.
    ///
    /// Returns `false` if it was consumed concurrently, has expired, or
    /// went over its attempt budget.
    pub async fn consume(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE share_otps SET consumed_at = NOW()
             WHERE id = $1
               AND consumed_at IS NULL
               AND attempts <= $2
               AND expires_at > NOW()",
        )
        .bind(id)
        .bind(MAX_OTP_ATTEMPTS)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete codes that can no longer be redeemed.
    pub async fn cleanup_dead(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM share_otps
             WHERE expires_at < NOW() OR consumed_at IS NOT NULL OR attempts >= $1",
        )
        .bind(MAX_OTP_ATTEMPTS)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
