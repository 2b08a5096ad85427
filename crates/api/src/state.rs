use std::sync::Arc;

use cutroom_events::{EventBus, MailTransport};

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::share::cache::ShareSessionCache;
use crate::storage::Storage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cutroom_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Publishes comment and approval events to the notification router.
    pub event_bus: Arc<EventBus>,
    /// Outbound email (SMTP in production, log-only without SMTP config).
    pub mailer: Arc<dyn MailTransport>,
    /// Keyed attempt counters for share-link authentication.
    pub rate_limiter: Arc<RateLimiter>,
    /// Short-lived positive cache of share session lookups.
    pub share_sessions: Arc<ShareSessionCache>,
    /// Uploaded file storage.
    pub storage: Arc<Storage>,
}
