//! Share-link access rules.
//!
//! A project is exposed to clients through a share slug. How a viewer gets
//! in is decided by the project's auth mode; what they may do once inside
//! is decided by the session scope and the project status.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::error::CoreError;
use crate::types::Timestamp;

/* --------------------------------------------------------------------------
Auth modes
-------------------------------------------------------------------------- */

/// Anyone holding the link can view.
pub const AUTH_MODE_NONE: &str = "none";
/// A shared project password is required.
pub const AUTH_MODE_PASSWORD: &str = "password";
/// An emailed one-time code is required.
pub const AUTH_MODE_OTP: &str = "otp";
/// Either a password or a one-time code is accepted.
pub const AUTH_MODE_BOTH: &str = "both";

pub const VALID_AUTH_MODES: &[&str] = &[
    AUTH_MODE_NONE,
    AUTH_MODE_PASSWORD,
    AUTH_MODE_OTP,
    AUTH_MODE_BOTH,
];

/// Validate that an auth mode string is one of the accepted values.
pub fn validate_auth_mode(mode: &str) -> Result<(), CoreError> {
    if VALID_AUTH_MODES.contains(&mode) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid auth mode '{mode}'. Must be one of: {}",
            VALID_AUTH_MODES.join(", ")
        )))
    }
}

/// Whether the mode accepts the project password.
pub fn password_allowed(mode: &str) -> bool {
    mode == AUTH_MODE_PASSWORD || mode == AUTH_MODE_BOTH
}

/// Whether the mode accepts emailed one-time codes.
pub fn otp_allowed(mode: &str) -> bool {
    mode == AUTH_MODE_OTP || mode == AUTH_MODE_BOTH
}

/* --------------------------------------------------------------------------
Sessions
-------------------------------------------------------------------------- */

/// Session opened on a project with `auth_mode = none`.
pub const ACCESS_OPEN: &str = "open";
pub const ACCESS_PASSWORD: &str = "password";
pub const ACCESS_OTP: &str = "otp";
pub const ACCESS_GUEST: &str = "guest";
/// Staff member using their own access token on a share route.
pub const ACCESS_ADMIN: &str = "admin";

/// View, comment, approve, and download (when the project allows it).
pub const SCOPE_FULL: &str = "full";
/// View only.
pub const SCOPE_GUEST: &str = "guest";

/// Scope granted by a given access method.
pub fn scope_for_access(access: &str) -> &'static str {
    if access == ACCESS_GUEST {
        SCOPE_GUEST
    } else {
        SCOPE_FULL
    }
}

/* --------------------------------------------------------------------------
Project status
-------------------------------------------------------------------------- */

pub const PROJECT_STATUS_IN_REVIEW: &str = "in_review";
pub const PROJECT_STATUS_APPROVED: &str = "approved";
/// Clients may watch but not comment or approve.
pub const PROJECT_STATUS_SHARE_ONLY: &str = "share_only";
/// Hidden from clients entirely.
pub const PROJECT_STATUS_ARCHIVED: &str = "archived";

pub const VALID_PROJECT_STATUSES: &[&str] = &[
    PROJECT_STATUS_IN_REVIEW,
    PROJECT_STATUS_APPROVED,
    PROJECT_STATUS_SHARE_ONLY,
    PROJECT_STATUS_ARCHIVED,
];

/// Validate that a project status string is one of the accepted values.
pub fn validate_project_status(status: &str) -> Result<(), CoreError> {
    if VALID_PROJECT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid project status '{status}'. Must be one of: {}",
            VALID_PROJECT_STATUSES.join(", ")
        )))
    }
}

/// Whether clients may comment on and approve videos in a project.
pub fn clients_can_interact(status: &str) -> bool {
    status == PROJECT_STATUS_IN_REVIEW || status == PROJECT_STATUS_APPROVED
}

/// Whether the project is reachable through its share link at all.
pub fn is_shared(status: &str) -> bool {
    status != PROJECT_STATUS_ARCHIVED
}

/* --------------------------------------------------------------------------
Slugs
-------------------------------------------------------------------------- */

/// Length of a generated share slug.
pub const SHARE_SLUG_LENGTH: usize = 16;

const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{1,62})[a-z0-9]$").expect("valid regex"));

/// Generate a random lowercase alphanumeric share slug.
pub fn generate_share_slug() -> String {
    let mut rng = rand::rng();
    (0..SHARE_SLUG_LENGTH)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Validate a custom share slug: 3-64 chars of `[a-z0-9-]`, no hyphen at
/// either end.
pub fn validate_share_slug(slug: &str) -> Result<(), CoreError> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid share slug '{slug}'. Use 3-64 lowercase letters, digits or hyphens, \
             starting and ending with a letter or digit"
        )))
    }
}

/* --------------------------------------------------------------------------
One-time codes
-------------------------------------------------------------------------- */

/// Number of digits in an emailed code.
pub const OTP_LENGTH: usize = 6;

/// Wrong guesses allowed against a single code before it is dead.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Generate a uniformly random 6-digit code. Leading zeros are kept.
pub fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Validate the shape of a submitted code.
pub fn validate_otp_format(code: &str) -> Result<(), CoreError> {
    if code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Verification code must be exactly {OTP_LENGTH} digits"
        )))
    }
}

/// Whether a stored code can still be redeemed.
pub fn otp_is_live(
    expires_at: Timestamp,
    consumed_at: Option<Timestamp>,
    attempts: i32,
    now: Timestamp,
) -> bool {
    consumed_at.is_none() && attempts < MAX_OTP_ATTEMPTS && expires_at > now
}

/// Normalise an email address for recipient lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
