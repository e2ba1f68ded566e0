//! Session registry integration tests.
//!
//! Create, refresh, end/kill and idle expiry of logical sessions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use proxy_core::session::spawn_expiry_sweep;
use proxy_core::{Lsid, SessionRegistry, SessionState};

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_first_use_creates_then_refreshes() {
    let registry = SessionRegistry::new();
    let s1 = Lsid::from("S1");

    let (first, created) = registry.create_or_update(&s1);
    assert!(created);
    assert_eq!(first.state, SessionState::Active);

    thread::sleep(Duration::from_millis(5));

    let (second, created) = registry.create_or_update(&s1);
    assert!(!created);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.last_used_at > first.last_used_at);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_idle_session_expires() {
    let registry = SessionRegistry::with_idle_timeout(Duration::from_secs(60));
    let s1 = Lsid::from("S1");
    registry.create_or_update(&s1);

    // Not yet past the timeout
    let expired = registry.expire_idle_at(Instant::now() + Duration::from_secs(30));
    assert!(expired.is_empty());
    assert!(registry.contains(&s1));

    let expired = registry.expire_idle_at(Instant::now() + Duration::from_secs(61));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, s1);
    assert_eq!(expired[0].state, SessionState::Expired);

    assert!(!registry.contains(&s1));
    assert!(!registry.refresh(&s1));
}

#[test]
fn test_kill_unknown_session_twice() {
    let registry = SessionRegistry::new();
    let s2 = Lsid::from("S2");

    assert_eq!(registry.kill(&[s2.clone()]), 0);
    assert_eq!(registry.kill(&[s2]), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_end_then_reuse_creates_fresh_session() {
    let registry = SessionRegistry::new();
    let id = Lsid::from("reused");

    let (original, _) = registry.create_or_update(&id);
    assert_eq!(registry.end(&[id.clone()]), 1);
    assert_eq!(registry.end(&[id.clone()]), 0);

    let (fresh, created) = registry.create_or_update(&id);
    assert!(created);
    assert!(fresh.created_at >= original.created_at);
}

#[test]
fn test_kill_all_clears_registry() {
    let registry = SessionRegistry::new();
    for i in 0..10 {
        registry.create_or_update(&Lsid::new(format!("s{i}")));
    }

    assert_eq!(registry.kill_all(), 10);
    assert!(registry.is_empty());
    assert_eq!(registry.kill_all(), 0);
}

// ============================================================================
// Background Sweep Tests
// ============================================================================

#[tokio::test]
async fn test_sweeper_expires_idle_sessions() {
    let registry = Arc::new(SessionRegistry::with_idle_timeout(Duration::from_millis(500)));
    let idle = Lsid::from("idle");
    let busy = Lsid::from("busy");
    registry.create_or_update(&idle);
    registry.create_or_update(&busy);

    let handle = spawn_expiry_sweep(&registry, Duration::from_millis(20));

    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(25)).await;
        registry.refresh(&busy);
    }

    assert!(!registry.contains(&idle));
    assert!(registry.contains(&busy));

    drop(registry);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_refresh_races_with_expiry() {
    let registry = Arc::new(SessionRegistry::with_idle_timeout(Duration::from_millis(200)));
    let id = Lsid::from("hot");
    registry.create_or_update(&id);

    let stop = Arc::new(AtomicBool::new(false));

    let refresher = {
        let registry = Arc::clone(&registry);
        let stop = Arc::clone(&stop);
        let id = id.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                assert!(registry.refresh(&id), "refreshed session was expired");
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let sweepers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut removed = 0;
                while !stop.load(Ordering::Relaxed) {
                    removed += registry.expire_idle().len();
                }
                removed
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(300));
    stop.store(true, Ordering::Relaxed);

    refresher.join().unwrap();
    for sweeper in sweepers {
        assert_eq!(sweeper.join().unwrap(), 0);
    }
    assert!(registry.contains(&id));
}

#[test]
fn test_concurrent_first_use_creates_once() {
    let registry = Arc::new(SessionRegistry::new());
    let id = Lsid::from("shared");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            thread::spawn(move || registry.create_or_update(&id).1)
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(created, 1);
    assert_eq!(registry.len(), 1);
}
