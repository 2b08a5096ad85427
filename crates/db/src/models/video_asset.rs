//! Video asset model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `video_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoAsset {
    pub id: DbId,
    pub video_id: DbId,
    pub file_name: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub category: String,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateVideoAsset {
    pub video_id: DbId,
    pub file_name: String,
    pub storage_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub category: String,
}
