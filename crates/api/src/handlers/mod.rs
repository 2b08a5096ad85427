//! Request handlers.
//!
//! Staff handlers authorize through the RBAC extractors in
//! [`crate::middleware`]; client handlers in [`share`] go through
//! [`crate::share::access::ShareAccess`]. Handlers delegate to the
//! repositories in `cutroom_db` and map errors via [`crate::error::AppError`].

pub mod admin;
pub mod auth;
pub mod comments;
pub mod content;
pub mod dashboard;
pub mod key_dates;
pub mod projects;
pub mod sales;
pub mod share;
pub mod videos;
