//! Cutroom API server library.
//!
//! Exposes config, state, error handling, and the router so integration
//! tests and the binary entrypoint build the same application.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod rate_limit;
pub mod response;
pub mod router;
pub mod routes;
pub mod share;
pub mod state;
pub mod storage;
