//! Fixed-window attempt limiting for share-link authentication.
//!
//! Counters live in a [`DashMap`] keyed by caller-supplied strings such as
//! `"pw:{slug}:{ip}"`. Each key gets a window that opens on its first
//! attempt; once the window's budget is spent further attempts are refused
//! until it closes. Stale windows are dropped by [`RateLimiter::prune`].

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Attempt budget for one class of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub window: Duration,
}

/// Share password attempts per (slug, client IP).
pub const SHARE_PASSWORD_POLICY: RateLimitPolicy = RateLimitPolicy {
    max_attempts: 10,
    window: Duration::from_secs(15 * 60),
};

/// One-time code requests per (slug, email).
pub const OTP_REQUEST_POLICY: RateLimitPolicy = RateLimitPolicy {
    max_attempts: 3,
    window: Duration::from_secs(15 * 60),
};

/// One-time code verification attempts per (slug, client IP).
pub const OTP_VERIFY_POLICY: RateLimitPolicy = RateLimitPolicy {
    max_attempts: 10,
    window: Duration::from_secs(15 * 60),
};

/// Open-link sessions minted per (slug, client IP).
pub const OPEN_SESSION_POLICY: RateLimitPolicy = RateLimitPolicy {
    max_attempts: 30,
    window: Duration::from_secs(15 * 60),
};

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: Instant,
    length: Duration,
    attempts: u32,
}

impl Window {
    fn closes_at(&self) -> Instant {
        self.opened_at + self.length
    }
}

/// Keyed fixed-window limiter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt under `key`.
    ///
    /// Returns `Err(retry_after_secs)` when the key's budget is spent.
    pub fn check(&self, key: &str, policy: RateLimitPolicy) -> Result<(), u64> {
        self.check_at(key, policy, Instant::now())
    }

    fn check_at(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> Result<(), u64> {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            opened_at: now,
            length: policy.window,
            attempts: 0,
        });

        if now >= entry.closes_at() {
            *entry = Window {
                opened_at: now,
                length: policy.window,
                attempts: 0,
            };
        }

        if entry.attempts >= policy.max_attempts {
            let remaining = entry.closes_at().saturating_duration_since(now);
            return Err(remaining.as_secs().max(1));
        }

        entry.attempts += 1;
        Ok(())
    }

    /// Forget a key, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Drop closed windows. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    fn prune_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.closes_at());
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
