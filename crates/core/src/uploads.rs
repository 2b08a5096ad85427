//! Upload validation, file naming, and byte-range parsing.

use crate::error::CoreError;

/// Video container extensions accepted for upload.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "mkv"];

pub const ASSET_CATEGORY_IMAGE: &str = "image";
pub const ASSET_CATEGORY_AUDIO: &str = "audio";
pub const ASSET_CATEGORY_DOCUMENT: &str = "document";
pub const ASSET_CATEGORY_PROJECT_FILE: &str = "project_file";
pub const ASSET_CATEGORY_CAPTION: &str = "caption";
pub const ASSET_CATEGORY_OTHER: &str = "other";

pub const VALID_ASSET_CATEGORIES: &[&str] = &[
    ASSET_CATEGORY_IMAGE,
    ASSET_CATEGORY_AUDIO,
    ASSET_CATEGORY_DOCUMENT,
    ASSET_CATEGORY_PROJECT_FILE,
    ASSET_CATEGORY_CAPTION,
    ASSET_CATEGORY_OTHER,
];

/// Maximum length of a stored file name.
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Lowercased extension of a file name, or an empty string.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Reject files that are not a supported video container.
pub fn validate_video_file_name(file_name: &str) -> Result<(), CoreError> {
    let ext = extension_of(file_name);
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported video format '.{ext}'. Supported: {}",
            VIDEO_EXTENSIONS.join(", ")
        )))
    }
}

/// Validate an explicit asset category.
pub fn validate_asset_category(category: &str) -> Result<(), CoreError> {
    if VALID_ASSET_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid asset category '{category}'. Must be one of: {}",
            VALID_ASSET_CATEGORIES.join(", ")
        )))
    }
}

/// Guess an asset category from its file extension.
pub fn infer_asset_category(file_name: &str) -> &'static str {
    match extension_of(file_name).as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "tif" | "tiff" | "psd" => ASSET_CATEGORY_IMAGE,
        "wav" | "mp3" | "aac" | "m4a" | "flac" | "aif" | "aiff" => ASSET_CATEGORY_AUDIO,
        "pdf" | "doc" | "docx" | "txt" | "rtf" | "xlsx" | "csv" => ASSET_CATEGORY_DOCUMENT,
        "prproj" | "aep" | "drp" | "fcpxml" | "xml" | "zip" => ASSET_CATEGORY_PROJECT_FILE,
        "srt" | "vtt" | "scc" => ASSET_CATEGORY_CAPTION,
        _ => ASSET_CATEGORY_OTHER,
    }
}

/// Reduce a client-supplied file name to a safe base name.
///
/// Strips directory components and control characters. Falls back to
/// `fallback` when nothing usable is left.
pub fn sanitize_file_name(raw: &str, fallback: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Guess a Content-Type from a file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "aac" => "audio/aac",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/* --------------------------------------------------------------------------
Range requests
-------------------------------------------------------------------------- */

/// Outcome of resolving a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Inclusive `start..=end` within the file.
    Partial { start: u64, end: u64 },
    /// The header parsed but cannot be satisfied (416).
    Unsatisfiable,
}

/// Resolve a single-range `Range: bytes=...` header.
///
/// Supports `bytes=S-E`, `bytes=S-` (clamped to `max_chunk` bytes) and the
/// suffix form `bytes=-N`. Returns `None` for headers that do not parse,
/// which callers treat as "serve the whole file".
pub fn resolve_range(header: &str, file_size: u64, max_chunk: u64) -> Option<ByteRange> {
    let range = header.trim().strip_prefix("bytes=")?;
    if range.contains(',') {
        return None;
    }
    let (start_s, end_s) = range.split_once('-')?;

    if file_size == 0 {
        return Some(ByteRange::Unsatisfiable);
    }
    let last = file_size - 1;

    if start_s.is_empty() {
        let suffix: u64 = end_s.parse().ok()?;
        if suffix == 0 {
            return Some(ByteRange::Unsatisfiable);
        }
        let start = file_size.saturating_sub(suffix);
        return Some(ByteRange::Partial { start, end: last });
    }

    let start: u64 = start_s.parse().ok()?;
    let end = if end_s.is_empty() {
        start.saturating_add(max_chunk.max(1) - 1).min(last)
    } else {
        end_s.parse::<u64>().ok()?.min(last)
    };

    if start > last || start > end {
        Some(ByteRange::Unsatisfiable)
    } else {
        Some(ByteRange::Partial { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_extensions() {
        assert!(validate_video_file_name("final_v3.MP4").is_ok());
        assert!(validate_video_file_name("cut.mov").is_ok());
        assert!(validate_video_file_name("notes.pdf").is_err());
        assert!(validate_video_file_name("noextension").is_err());
        assert!(validate_video_file_name(".mp4").is_err());
    }

    #[test]
    fn category_inference() {
        assert_eq!(infer_asset_category("poster.PNG"), ASSET_CATEGORY_IMAGE);
        assert_eq!(infer_asset_category("mix.wav"), ASSET_CATEGORY_AUDIO);
        assert_eq!(infer_asset_category("subs.srt"), ASSET_CATEGORY_CAPTION);
        assert_eq!(infer_asset_category("edit.prproj"), ASSET_CATEGORY_PROJECT_FILE);
        assert_eq!(infer_asset_category("mystery.bin"), ASSET_CATEGORY_OTHER);
    }

    #[test]
    fn file_names_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd", "f"), "passwd");
        assert_eq!(sanitize_file_name("C:\\clips\\take1.mov", "f"), "take1.mov");
        assert_eq!(sanitize_file_name("bad\u{0007}name.mp4", "f"), "badname.mp4");
        assert_eq!(sanitize_file_name("..", "upload.bin"), "upload.bin");
        assert_eq!(sanitize_file_name("", "upload.bin"), "upload.bin");
    }

    #[test]
    fn explicit_range() {
        assert_eq!(
            resolve_range("bytes=0-99", 1000, 1 << 20),
            Some(ByteRange::Partial { start: 0, end: 99 })
        );
        assert_eq!(
            resolve_range("bytes=900-5000", 1000, 1 << 20),
            Some(ByteRange::Partial { start: 900, end: 999 })
        );
    }

    #[test]
    fn open_range_is_chunked() {
        assert_eq!(
            resolve_range("bytes=100-", 10_000, 1000),
            Some(ByteRange::Partial { start: 100, end: 1099 })
        );
        assert_eq!(
            resolve_range("bytes=9500-", 10_000, 1000),
            Some(ByteRange::Partial { start: 9500, end: 9999 })
        );
    }

    #[test]
    fn suffix_range() {
        assert_eq!(
            resolve_range("bytes=-100", 1000, 1 << 20),
            Some(ByteRange::Partial { start: 900, end: 999 })
        );
        assert_eq!(
            resolve_range("bytes=-5000", 1000, 1 << 20),
            Some(ByteRange::Partial { start: 0, end: 999 })
        );
    }

    #[test]
    fn unsatisfiable_ranges() {
        assert_eq!(
            resolve_range("bytes=1000-", 1000, 1 << 20),
            Some(ByteRange::Unsatisfiable)
        );
        assert_eq!(
            resolve_range("bytes=50-10", 1000, 1 << 20),
            Some(ByteRange::Unsatisfiable)
        );
        assert_eq!(resolve_range("bytes=0-", 0, 1 << 20), Some(ByteRange::Unsatisfiable));
    }

    #[test]
    fn malformed_ranges_ignored() {
        assert_eq!(resolve_range("items=0-10", 1000, 1 << 20), None);
        assert_eq!(resolve_range("bytes=abc-", 1000, 1 << 20), None);
        assert_eq!(resolve_range("bytes=0-10,20-30", 1000, 1 << 20), None);
    }
}
