//! Request extractors for authentication, authorization, and client metadata.
//!
//! - [`auth::AuthUser`] -- staff user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireStaff`] -- requires `admin` or `editor`.
//! - [`client::ClientInfo`] -- caller IP and user agent.
//!
//! Client share sessions are resolved by [`crate::share::access::ShareAccess`].

pub mod auth;
pub mod client;
pub mod rbac;
