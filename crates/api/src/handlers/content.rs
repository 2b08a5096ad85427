//! Byte-range streaming of stored videos and assets.
//!
//! Files are reached only through short-lived content tokens, so the URL
//! itself is the credential and can be handed to a `<video>` element.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use cutroom_core::uploads::{resolve_range, ByteRange};
use cutroom_db::repositories::{VideoAssetRepo, VideoRepo};

use crate::auth::jwt::validate_content_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Maximum bytes served for an open-ended range (1 MiB).
const MAX_CHUNK_SIZE: u64 = 1024 * 1024;

/// A stored file about to be streamed.
struct ContentFile {
    storage_path: String,
    mime_type: String,
    /// Set for downloads; videos play inline.
    download_name: Option<String>,
}

/// GET /api/v1/content/{token}
///
/// Honours single `Range` requests with 206 / 416; serves the whole file
/// otherwise.
pub async fn stream_content(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let claims = validate_content_token(&token, &state.config.jwt)
        .map_err(|_| AppError::unauthorized("Invalid or expired content link"))?;

    let content = match claims.aid {
        Some(asset_id) => {
            let (asset, project_id) = VideoAssetRepo::find_with_project(&state.pool, asset_id)
                .await?
                .filter(|(a, pid)| *pid == claims.pid && a.video_id == claims.vid)
                .ok_or(AppError::not_found("VideoAsset", asset_id))?;
            tracing::debug!(project_id, asset_id, "Streaming asset");
            ContentFile {
                storage_path: asset.storage_path,
                mime_type: asset.mime_type,
                download_name: Some(asset.file_name),
            }
        }
        None => {
            let video = VideoRepo::find_in_project(&state.pool, claims.pid, claims.vid)
                .await?
                .ok_or(AppError::not_found("Video", claims.vid))?;
            ContentFile {
                storage_path: video.storage_path,
                mime_type: video.mime_type,
                download_name: None,
            }
        }
    };

    let path = state.storage.resolve(&content.storage_path)?;
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(path = %path.display(), "Stored file is missing");
            return Err(AppError::NotFound("The file is no longer available".into()));
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };
    let file_size = metadata.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| resolve_range(v, file_size, MAX_CHUNK_SIZE));

    match range {
        Some(ByteRange::Unsatisfiable) => build_response(
            Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{file_size}")),
            Body::empty(),
        ),
        Some(ByteRange::Partial { start, end }) => {
            let length = end - start + 1;
            let body = open_body(&path, start, length).await?;
            let builder = content_headers(
                Response::builder().status(StatusCode::PARTIAL_CONTENT),
                &content,
            )
            .header(header::CONTENT_LENGTH, length)
            .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}"));
            build_response(builder, body)
        }
        None => {
            let body = open_body(&path, 0, file_size).await?;
            let builder = content_headers(Response::builder().status(StatusCode::OK), &content)
                .header(header::CONTENT_LENGTH, file_size);
            build_response(builder, body)
        }
    }
}

async fn open_body(path: &FsPath, start: u64, length: u64) -> AppResult<Body> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    if start > 0 {
        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
    }
    Ok(Body::from_stream(ReaderStream::new(file.take(length))))
}

fn content_headers(
    builder: axum::http::response::Builder,
    content: &ContentFile,
) -> axum::http::response::Builder {
    let content_type = HeaderValue::from_str(&content.mime_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let builder = builder
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "private, max-age=300");
    match &content.download_name {
        Some(name) => builder.header(header::CONTENT_DISPOSITION, attachment_disposition(name)),
        None => builder,
    }
}

fn build_response(builder: axum::http::response::Builder, body: Body) -> AppResult<Response> {
    builder
        .body(body)
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}

/// `attachment` disposition with an ASCII-safe quoted filename.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_escapes_quotes_and_non_ascii() {
        assert_eq!(
            attachment_disposition("cut \"final\".mov"),
            "attachment; filename=\"cut _final_.mov\""
        );
        assert_eq!(
            attachment_disposition("café.wav"),
            "attachment; filename=\"caf_.wav\""
        );
    }
}
