//! Thread-safe access to the process state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::metrics::StateCollector;
use super::{store, ProcessState, Subscription, SubscriptionHub};
use crate::error::ProxyError;
use crate::Result;

/// File name used by [`StateProvider::open_dir`].
pub const STATE_FILE_NAME: &str = "state.json";

struct Inner {
    state: ProcessState,
    hub: SubscriptionHub,
}

/// Owner of the process state.
///
/// Readers get independent copies; writers go through [`update`], which
/// fills, persists and notifies subscribers while holding the exclusive
/// lock, so no reader ever sees a partially applied change.
///
/// All methods are thread-safe. Create one provider at startup and hand an
/// `Arc` of it to everything that needs process state.
///
/// [`update`]: StateProvider::update
pub struct StateProvider {
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
}

impl StateProvider {
    /// Create a provider backed by the file at `path`, or an in-memory one
    /// if `path` is `None`.
    ///
    /// The file is read if present and the state is filled, but nothing is
    /// written; call [`persist`](Self::persist) for that.
    pub fn new(path: Option<PathBuf>) -> Self {
        let mut state = path.as_deref().map(store::load).unwrap_or_default();
        state.fill();

        Self {
            path,
            inner: RwLock::new(Inner {
                state,
                hub: SubscriptionHub::new(),
            }),
        }
    }

    /// Create a provider and write its state immediately.
    ///
    /// The initial write repairs a missing directory or corrupted file and
    /// surfaces permission problems early.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let provider = Self::new(path);
        provider.persist()?;
        Ok(provider)
    }

    /// Create a provider storing `state.json` inside `dir`.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(ProxyError::StateDirNotSet);
        }

        let path = std::path::absolute(dir.join(STATE_FILE_NAME))?;
        Self::open(Some(path))
    }

    /// Path of the state file, if persistence is enabled.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return a copy of the current state.
    ///
    /// Cheap enough to call on every request; callers should not cache it.
    pub fn get(&self) -> ProcessState {
        self.read().state.deep_copy()
    }

    /// Write the current state to disk without changing it.
    ///
    /// Takes the exclusive lock: writes share one temporary file.
    pub fn persist(&self) -> Result<()> {
        let inner = self.write();
        store::persist(&inner.state, self.path())
    }

    /// Apply `f` to the state, persist the result and notify subscribers.
    ///
    /// The new state replaces the old one even if persisting fails; the
    /// persistence error is returned to the caller.
    ///
    /// `f` must not call back into this provider: the exclusive lock is held
    /// while it runs, so doing so deadlocks.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ProcessState),
    {
        let mut inner = self.write();

        let mut next = inner.state.deep_copy();
        f(&mut next);
        next.fill();
        inner.state = next;

        let res = store::persist(&inner.state, self.path());
        inner.hub.notify_all();

        res
    }

    /// Subscribe to state changes. One notification is pending immediately.
    pub fn subscribe(&self) -> Subscription {
        self.write().hub.register()
    }

    /// Prometheus collector snapshotting this provider on every scrape.
    ///
    /// If `include_uuid` is true, the instance UUID is exported as a label.
    pub fn metrics_collector(self: &Arc<Self>, include_uuid: bool) -> Result<StateCollector> {
        StateCollector::new(Arc::clone(self), include_uuid)
    }

    /// Debug variable rendering the full state as JSON.
    pub fn debug_var(&self) -> StateVar<'_> {
        StateVar { provider: self }
    }

    // The live state is replaced wholesale only after `f` returns, so a
    // poisoned guard still holds a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for StateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateProvider")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Structured-text dump of the current state, see [`StateProvider::debug_var`].
pub struct StateVar<'a> {
    provider: &'a StateProvider,
}

impl fmt::Display for StateVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = serde_json::Value::Object(self.provider.get().as_map());
        write!(f, "{map}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RuntimeFlag;
    use tempfile::TempDir;

    #[test]
    fn test_new_in_memory() {
        let provider = StateProvider::new(None);
        let state = provider.get();

        assert!(uuid::Uuid::parse_str(&state.uuid).is_ok());
        assert!(state.start.is_some());
        assert!(provider.path().is_none());
    }

    #[test]
    fn test_get_returns_copy() {
        let provider = StateProvider::new(None);

        let mut copy = provider.get();
        copy.telemetry = Some(true);
        copy.set_flag("x", RuntimeFlag::Int(1));

        let fresh = provider.get();
        assert_eq!(fresh.telemetry, None);
        assert!(fresh.flag("x").is_none());
    }

    #[test]
    fn test_update_applies_and_fills() {
        let provider = StateProvider::new(None);
        let before = provider.get();

        provider
            .update(|s| {
                s.uuid.clear();
                s.telemetry = Some(false);
            })
            .unwrap();

        let after = provider.get();
        assert_eq!(after.telemetry, Some(false));
        assert!(uuid::Uuid::parse_str(&after.uuid).is_ok());
        assert_ne!(after.uuid, before.uuid);
        assert_eq!(after.start, before.start);
    }

    #[test]
    fn test_update_notifies_subscribers() {
        let provider = StateProvider::new(None);
        let mut sub = provider.subscribe();
        assert!(sub.try_changed());
        assert!(!sub.try_changed());

        provider.update(|s| s.update_available = true).unwrap();
        assert!(sub.try_changed());
    }

    #[test]
    fn test_open_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let provider = StateProvider::open(Some(path.clone())).unwrap();
        assert!(path.exists());

        let on_disk = store::load(&path);
        assert_eq!(on_disk.uuid, provider.get().uuid);
    }

    #[test]
    fn test_open_dir() {
        let dir = TempDir::new().unwrap();
        let provider = StateProvider::open_dir(dir.path().join("data")).unwrap();

        let path = provider.path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("data/state.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_open_dir_empty() {
        let err = StateProvider::open_dir("").unwrap_err();
        assert!(matches!(err, ProxyError::StateDirNotSet));
    }

    #[test]
    fn test_update_keeps_state_when_persist_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let provider = StateProvider::new(Some(blocker.join("state.json")));
        let mut sub = provider.subscribe();
        assert!(sub.try_changed());

        let err = provider.update(|s| s.telemetry = Some(true)).unwrap_err();
        assert!(matches!(err, ProxyError::Persist { .. }));

        assert_eq!(provider.get().telemetry, Some(true));
        assert!(sub.try_changed());
    }

    #[test]
    fn test_panicking_update_leaves_state_untouched() {
        let provider = Arc::new(StateProvider::new(None));
        let before = provider.get();

        let p = Arc::clone(&provider);
        let res = std::thread::spawn(move || {
            let _ = p.update(|s| {
                s.telemetry = Some(true);
                panic!("update closure failed");
            });
        })
        .join();
        assert!(res.is_err());

        assert_eq!(provider.get(), before);
        provider.update(|s| s.telemetry = Some(false)).unwrap();
        assert_eq!(provider.get().telemetry, Some(false));
    }

    #[test]
    fn test_debug_var() {
        let provider = StateProvider::new(None);
        let uuid = provider.get().uuid;

        let text = provider.debug_var().to_string();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["uuid"], uuid.as_str());
        assert_eq!(parsed["telemetry"], "undecided");
    }
}
