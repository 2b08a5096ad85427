//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- staff access tokens, share tokens, content tokens, and
//!   refresh-token helpers.

pub mod jwt;
pub mod password;
