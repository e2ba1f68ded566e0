//! Registry of active logical sessions.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{Lsid, SessionState};

/// Idle time after which a session expires, unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A logical session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Client-supplied identifier.
    pub id: Lsid,
    /// Current state.
    pub state: SessionState,
    /// Time when the session was first referenced.
    pub created_at: Instant,
    /// Time of the last reference or refresh.
    pub last_used_at: Instant,
}

impl SessionRecord {
    fn new(id: Lsid, now: Instant) -> Self {
        Self {
            id,
            state: SessionState::Active,
            created_at: now,
            last_used_at: now,
        }
    }

    fn touch(&mut self, now: Instant) {
        self.last_used_at = self.last_used_at.max(now);
    }

    /// Idle duration since last use.
    pub fn idle_duration(&self) -> Duration {
        self.last_used_at.elapsed()
    }

    /// Idle duration as seen at `now`.
    pub fn idle_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_used_at)
    }
}

/// Thread-safe registry of active sessions keyed by LSID.
///
/// The map is sharded, so operations on unrelated sessions rarely contend.
/// A refresh and the expiry decision for the same session are serialized
/// by the shard lock: a refresh that lands first always saves the session.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<Lsid, SessionRecord>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    /// Create an empty registry with the default idle timeout.
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Create an empty registry with a custom idle timeout.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Create the session if unknown, otherwise mark it as used now.
    ///
    /// Returns a snapshot of the record and whether it was just created.
    pub fn create_or_update(&self, id: &Lsid) -> (SessionRecord, bool) {
        let now = Instant::now();

        match self.sessions.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().touch(now);
                (entry.get().clone(), false)
            }
            Entry::Vacant(entry) => {
                let record = SessionRecord::new(id.clone(), now);
                entry.insert(record.clone());
                debug!(lsid = %id, "Session created");
                (record, true)
            }
        }
    }

    /// Mark the session as used now.
    ///
    /// Returns `false` if the session does not exist; that is not an error.
    pub fn refresh(&self, id: &Lsid) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut record) => {
                record.touch(Instant::now());
                true
            }
            None => false,
        }
    }

    /// Refresh several sessions, returning how many existed.
    pub fn refresh_many(&self, ids: &[Lsid]) -> usize {
        ids.iter().filter(|id| self.refresh(id)).count()
    }

    /// End the given sessions at the client's request.
    ///
    /// Returns the number of sessions removed; unknown ids are skipped.
    pub fn end(&self, ids: &[Lsid]) -> usize {
        ids.iter()
            .filter_map(|id| self.terminate(id, SessionState::Ended))
            .inspect(|record| debug!(lsid = %record.id, "Session ended"))
            .count()
    }

    /// End every session.
    pub fn end_all(&self) -> usize {
        let removed = self.clear();
        debug!(count = removed, "All sessions ended");
        removed
    }

    /// Forcibly terminate the given sessions.
    ///
    /// Same effect as [`end`](Self::end); killing an absent session is a
    /// no-op.
    pub fn kill(&self, ids: &[Lsid]) -> usize {
        ids.iter()
            .filter_map(|id| self.terminate(id, SessionState::Ended))
            .inspect(|record| debug!(lsid = %record.id, "Session killed"))
            .count()
    }

    /// Forcibly terminate every session.
    pub fn kill_all(&self) -> usize {
        let removed = self.clear();
        debug!(count = removed, "All sessions killed");
        removed
    }

    /// Remove every session idle for longer than the timeout.
    pub fn expire_idle(&self) -> Vec<SessionRecord> {
        self.expire_idle_at(Instant::now())
    }

    /// Remove every session idle for longer than the timeout as of `now`.
    ///
    /// Returns the removed records in the `Expired` state.
    pub fn expire_idle_at(&self, now: Instant) -> Vec<SessionRecord> {
        let mut expired = Vec::new();

        self.sessions.retain(|_, record| {
            if record.idle_at(now) <= self.idle_timeout {
                return true;
            }

            record.state.transition_to(SessionState::Expired);
            expired.push(record.clone());
            false
        });

        for record in &expired {
            debug!(lsid = %record.id, "Session expired");
        }

        expired
    }

    /// Get a snapshot of the session with the given id.
    pub fn get(&self, id: &Lsid) -> Option<SessionRecord> {
        self.sessions.get(id).map(|r| r.clone())
    }

    pub fn contains(&self, id: &Lsid) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of all active sessions, in no particular order.
    pub fn list(&self) -> Vec<SessionRecord> {
        self.sessions.iter().map(|r| r.value().clone()).collect()
    }

    fn terminate(&self, id: &Lsid, state: SessionState) -> Option<SessionRecord> {
        let (_, mut record) = self.sessions.remove(id)?;
        record.state.transition_to(state);
        Some(record)
    }

    fn clear(&self) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, _| {
            removed += 1;
            false
        });
        removed
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
