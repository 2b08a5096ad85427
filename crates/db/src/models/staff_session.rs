//! Staff refresh-token sessions (`user_sessions`).

use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// One issued refresh token. Only its SHA-256 is stored.
#[derive(Debug, Clone, FromRow)]
pub struct StaffSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
}

pub struct NewStaffSession<'a> {
    pub user_id: DbId,
    pub refresh_token_hash: &'a str,
    pub expires_at: Timestamp,
    pub user_agent: Option<&'a str>,
    pub ip_address: &'a str,
}
