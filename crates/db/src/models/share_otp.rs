//! Emailed one-time code model.

use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `share_otps` table. Only a keyed hash of the code is kept.
#[derive(Debug, Clone, FromRow)]
pub struct ShareOtp {
    pub id: DbId,
    pub project_id: DbId,
    pub email: String,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateShareOtp {
    pub project_id: DbId,
    pub email: String,
    pub code_hash: String,
    pub expires_at: Timestamp,
}
