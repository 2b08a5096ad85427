//! Client share session model.

use serde::Serialize;
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `share_sessions` table.
///
/// `session_hash` is the SHA-256 of the session key carried in the share
/// token; the key itself is never stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareSession {
    pub id: DbId,
    pub project_id: DbId,
    #[serde(skip_serializing)]
    pub session_hash: String,
    pub access_method: String,
    pub recipient_id: Option<DbId>,
    pub display_name: Option<String>,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub last_seen_at: Timestamp,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateShareSession {
    pub project_id: DbId,
    pub session_hash: String,
    pub access_method: String,
    pub recipient_id: Option<DbId>,
    pub display_name: Option<String>,
    pub expires_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
