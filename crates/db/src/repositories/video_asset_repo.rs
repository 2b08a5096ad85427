//! Repository for the `video_assets` table.

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::video_asset::{CreateVideoAsset, VideoAsset};

const COLUMNS: &str = "id, video_id, file_name, storage_path, file_size_bytes, mime_type, \
                        category, created_at";

pub struct VideoAssetRepo;

impl VideoAssetRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateVideoAsset,
    ) -> Result<VideoAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_assets (video_id, file_name, storage_path, file_size_bytes, mime_type, category)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(input.video_id)
            .bind(&input.file_name)
            .bind(&input.storage_path)
            .bind(input.file_size_bytes)
            .bind(&input.mime_type)
            .bind(&input.category)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VideoAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_assets WHERE id = $1");
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset together with the project its video belongs to.
    pub async fn find_with_project(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(VideoAsset, DbId)>, sqlx::Error> {
        let Some(asset) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let project_id: Option<DbId> =
            sqlx::query_scalar("SELECT project_id FROM videos WHERE id = $1")
                .bind(asset.video_id)
                .fetch_optional(pool)
                .await?;
        Ok(project_id.map(|pid| (asset, pid)))
    }

    pub async fn list_by_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<VideoAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_assets WHERE video_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }

    /// Storage paths of every asset under a project, for file cleanup
    /// before the project row is deleted.
    pub async fn storage_paths_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT a.storage_path FROM video_assets a
             JOIN videos v ON v.id = a.video_id
             WHERE v.project_id = $1",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM video_assets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
