//! Client share-link access.
//!
//! - [`access::ShareAccess`] -- resolves the project behind a share slug and
//!   the caller's share session (or staff token) on every request.
//! - [`cache::ShareSessionCache`] -- short-lived positive cache of session
//!   lookups keyed by session hash.

pub mod access;
pub mod cache;
