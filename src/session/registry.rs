//! Session registry: the set of issued tokens that may still be used.
//!
//! A token is live iff it has an entry here and the current time is strictly
//! before the recorded expiry. A token with a valid signature but no entry
//! (renewed, flushed, never issued by this process) is not live.
//!
//! One reader/writer lock guards the whole map: liveness checks share the read
//! lock, every mutation takes the write lock.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// token -> expiry
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the session for `token`.
    pub fn record(&self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.sessions.write().insert(token.into(), expires_at);
    }

    pub fn is_live(&self, token: &str) -> bool {
        self.is_live_at(token, Utc::now())
    }

    /// Liveness against an explicit clock reading.
    pub fn is_live_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.sessions
            .read()
            .get(token)
            .is_some_and(|expires_at| now < *expires_at)
    }

    /// Remove `token` if present. Returns whether an entry was removed.
    pub fn evict(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// Atomically replace a live `old` session with `new`.
    ///
    /// Returns `false` and leaves the registry untouched when `old` is missing
    /// or expired, so two concurrent renewals of one token cannot both win.
    pub fn rotate(
        &self,
        old: &str,
        new: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> bool {
        self.rotate_at(old, new, expires_at, Utc::now())
    }

    pub fn rotate_at(
        &self,
        old: &str,
        new: impl Into<String>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get(old) {
            Some(old_expiry) if now < *old_expiry => {
                sessions.remove(old);
                sessions.insert(new.into(), expires_at);
                true
            }
            _ => false,
        }
    }

    /// Drop every session. Returns how many were dropped.
    pub fn flush(&self) -> usize {
        let mut sessions = self.sessions.write();
        let dropped = sessions.len();
        sessions.clear();
        dropped
    }

    /// Drop sessions whose expiry is at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, expires_at| now < *expires_at);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
