//! Comment and approval rules.
//!
//! Comments are pinned to a playback position in seconds. Approval is
//! tracked per video version; a project is approved once every video
//! group has an approved version.

use std::collections::HashMap;

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length for a comment body.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Maximum length for a display name on a comment.
pub const MAX_AUTHOR_NAME_LENGTH: usize = 100;

/// Comment written by a staff member.
pub const AUTHOR_STAFF: &str = "staff";
/// Comment written by a client through a share session.
pub const AUTHOR_CLIENT: &str = "client";

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Validate a comment body: not blank and within the length limit.
pub fn validate_comment_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a playback position against the video duration (if known).
pub fn validate_timecode(secs: f64, duration_secs: Option<f64>) -> Result<(), CoreError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(CoreError::Validation(
            "Timecode must be a non-negative number of seconds".to_string(),
        ));
    }
    if let Some(duration) = duration_secs {
        if secs > duration {
            return Err(CoreError::Validation(format!(
                "Timecode {} is past the end of the video ({})",
                format_timecode(secs),
                format_timecode(duration)
            )));
        }
    }
    Ok(())
}

/// Validate and trim a commenter display name.
pub fn validate_author_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_AUTHOR_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name exceeds maximum length of {MAX_AUTHOR_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Render seconds as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_timecode(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/* --------------------------------------------------------------------------
Approval rollup
-------------------------------------------------------------------------- */

/// Whether every video group in a project has at least one approved
/// version. `versions` is `(group name, approved)` per version.
///
/// A project with no videos is never considered approved.
pub fn project_fully_approved<'a, I>(versions: I) -> bool
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut groups: HashMap<&str, bool> = HashMap::new();
    for (name, approved) in versions {
        let entry = groups.entry(name).or_insert(false);
        *entry |= approved;
    }
    !groups.is_empty() && groups.values().all(|approved| *approved)
}
