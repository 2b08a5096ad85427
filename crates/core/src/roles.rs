//! Well-known role name constants.
//!
//! These must match the seed data in `0001_users_and_sessions.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";

/// Role id of the seeded `admin` role.
pub const ROLE_ADMIN_ID: i64 = 1;
/// Role id of the seeded `editor` role.
pub const ROLE_EDITOR_ID: i64 = 2;

/// Whether a role may manage projects, videos, and comments.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_EDITOR
}
