//! Positive cache of live share sessions.
//!
//! Entries are keyed by session hash and live for at most [`CACHE_TTL`] or
//! until the session itself expires, whichever is sooner. Revocation paths
//! must call [`ShareSessionCache::invalidate`] (or the project-wide
//! variant) so a revoked session stops working immediately.
//!
//! Every invalidation bumps a generation counter. Sessions loaded from the
//! database go in through [`ShareSessionCache::insert_loaded`] with the
//! generation read before the load, so a revocation that lands between the
//! read and the insert cannot leave a stale entry behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use cutroom_core::types::{DbId, Timestamp};
use cutroom_db::models::share_session::ShareSession;

/// How long a verified session is trusted without hitting the database.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// The parts of a share session needed to authorise a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedShareSession {
    pub session_id: DbId,
    pub project_id: DbId,
    pub access_method: String,
    pub recipient_id: Option<DbId>,
    pub display_name: Option<String>,
    pub expires_at: Timestamp,
}

impl From<&ShareSession> for CachedShareSession {
    fn from(session: &ShareSession) -> Self {
        Self {
            session_id: session.id,
            project_id: session.project_id,
            access_method: session.access_method.clone(),
            recipient_id: session.recipient_id,
            display_name: session.display_name.clone(),
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    session: CachedShareSession,
    cached_at: Instant,
}

#[derive(Debug)]
pub struct ShareSessionCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    generation: AtomicU64,
}

impl Default for ShareSessionCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl ShareSessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Current invalidation generation. Read it before loading a session
    /// from the database.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Look up a live cached session.
    pub fn get(&self, session_hash: &str) -> Option<CachedShareSession> {
        let entry = self.entries.get(session_hash)?;
        if entry.cached_at.elapsed() < self.ttl && entry.session.expires_at > Utc::now() {
            return Some(entry.session.clone());
        }
        drop(entry);
        self.entries.remove(session_hash);
        None
    }

    pub fn insert(&self, session_hash: &str, session: CachedShareSession) {
        self.entries.insert(
            session_hash.to_string(),
            Entry {
                session,
                cached_at: Instant::now(),
            },
        );
    }

    /// Cache a session read from the database at generation `seen`.
    ///
    /// Returns `false`, leaving nothing cached, if any invalidation ran since
    /// `seen`. The entry is written first and checked after, so an
    /// invalidation racing with this call either removes the entry or moves
    /// the generation.
    pub fn insert_loaded(&self, session_hash: &str, session: CachedShareSession, seen: u64) -> bool {
        if self.generation() != seen {
            return false;
        }
        self.insert(session_hash, session);
        if self.generation() != seen {
            self.entries.remove(session_hash);
            return false;
        }
        true
    }

    pub fn invalidate(&self, session_hash: &str) {
        self.bump();
        self.entries.remove(session_hash);
    }

    pub fn invalidate_many(&self, session_hashes: &[String]) {
        self.bump();
        for hash in session_hashes {
            self.entries.remove(hash);
        }
    }

    /// Drop every cached session of a project.
    pub fn invalidate_project(&self, project_id: DbId) {
        self.bump();
        self.entries
            .retain(|_, entry| entry.session.project_id != project_id);
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop stale entries. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        self.entries.retain(|_, entry| {
            entry.cached_at.elapsed() < self.ttl && entry.session.expires_at > now
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
