//! Periodic cleanup of dead credentials.
//!
//! Every hour: deletes expired or revoked share sessions, dead one-time
//! codes and expired staff sessions, and prunes the in-memory session
//! cache and rate-limit windows.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use cutroom_db::repositories::{ShareOtpRepo, ShareSessionRepo, StaffSessionRepo};

use crate::rate_limit::RateLimiter;
use crate::share::cache::ShareSessionCache;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the cleanup loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    cache: Arc<ShareSessionCache>,
    limiter: Arc<RateLimiter>,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Credential cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Credential cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(&pool, &cache, &limiter).await;
            }
        }
    }
}

/// One cleanup pass. Each step logs its own failure and the rest still run.
pub async fn sweep(pool: &PgPool, cache: &ShareSessionCache, limiter: &RateLimiter) {
    match ShareSessionRepo::cleanup_expired(pool).await {
        Ok(0) => tracing::debug!("Cleanup: no share sessions to purge"),
        Ok(deleted) => tracing::info!(deleted, "Cleanup: purged share sessions"),
        Err(e) => tracing::error!(error = %e, "Cleanup: share session purge failed"),
    }

    match ShareOtpRepo::cleanup_dead(pool).await {
        Ok(0) => tracing::debug!("Cleanup: no codes to purge"),
        Ok(deleted) => tracing::info!(deleted, "Cleanup: purged one-time codes"),
        Err(e) => tracing::error!(error = %e, "Cleanup: code purge failed"),
    }

    match StaffSessionRepo::purge_dead(pool).await {
        Ok(0) => tracing::debug!("Cleanup: no staff sessions to purge"),
        Ok(deleted) => tracing::info!(deleted, "Cleanup: purged staff sessions"),
        Err(e) => tracing::error!(error = %e, "Cleanup: staff session purge failed"),
    }

    let cached = cache.prune();
    let windows = limiter.prune();
    if cached > 0 || windows > 0 {
        tracing::debug!(cached, windows, "Cleanup: pruned in-memory entries");
    }
}
