//! Local filesystem storage for uploaded videos and assets.
//!
//! Files live under a single root directory. Rows store paths relative to
//! that root (`projects/{id}/videos/{uuid}.mp4`), so the root can move
//! without rewriting the database.

use std::path::{Component, Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use cutroom_core::error::CoreError;
use cutroom_core::types::DbId;
use cutroom_core::uploads::extension_of;

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File exceeds the maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Upload stream failed: {0}")]
    Upload(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::Upload(msg) => AppError::BadRequest(msg),
            StorageError::InvalidPath(_) => AppError::Core(CoreError::Internal(err.to_string())),
            StorageError::Io(e) => AppError::InternalError(format!("Storage error: {e}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    max_upload_bytes: u64,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh relative path for a video upload.
    pub fn video_path(project_id: DbId, file_name: &str) -> String {
        format!(
            "projects/{project_id}/videos/{}.{}",
            Uuid::new_v4().simple(),
            extension_or_bin(file_name)
        )
    }

    /// A fresh relative path for a video asset upload.
    pub fn asset_path(project_id: DbId, video_id: DbId, file_name: &str) -> String {
        format!(
            "projects/{project_id}/assets/{video_id}/{}.{}",
            Uuid::new_v4().simple(),
            extension_or_bin(file_name)
        )
    }

    /// Absolute path for a stored relative path.
    ///
    /// Rejects absolute paths and any `..` component.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Stream a multipart field to `relative`, enforcing the upload limit.
    ///
    /// Returns the number of bytes written. A partially written file is
    /// removed on failure.
    pub async fn write_field(
        &self,
        field: &mut Field<'_>,
        relative: &str,
    ) -> Result<u64, StorageError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = self.copy_field(field, &path).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial upload");
                }
            }
        }
        result
    }

    async fn copy_field(&self, field: &mut Field<'_>, path: &Path) -> Result<u64, StorageError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?
        {
            written += chunk.len() as u64;
            if written > self.max_upload_bytes {
                return Err(StorageError::TooLarge {
                    limit: self.max_upload_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete several files, logging failures instead of stopping.
    pub async fn remove_all(&self, relatives: &[String]) {
        for relative in relatives {
            if let Err(e) = self.remove(relative).await {
                tracing::warn!(error = %e, path = %relative, "Failed to remove stored file");
            }
        }
    }
}

fn extension_or_bin(file_name: &str) -> String {
    let ext = extension_of(file_name);
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "bin".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_paths_are_relative() {
        let path = Storage::video_path(4, "Hero Cut.MOV");
        assert!(path.starts_with("projects/4/videos/"));
        assert!(path.ends_with(".mov"));
        assert!(Storage::asset_path(4, 9, "weird.ext!").ends_with(".bin"));
    }

    #[test]
    fn traversal_rejected() {
        let storage = Storage::new("/srv/cutroom", 1024);
        assert!(storage.resolve("projects/1/videos/a.mp4").is_ok());
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("projects/../../x").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[tokio::test]
    async fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path(), 1024);
        assert!(storage.remove("projects/1/videos/missing.mp4").await.is_ok());

        let path = storage.resolve("projects/1/videos/present.mp4").unwrap();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"data").await.unwrap();
        storage.remove("projects/1/videos/present.mp4").await.unwrap();
        assert!(!path.exists());
    }
}
