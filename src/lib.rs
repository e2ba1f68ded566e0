//! # proxy-core
//!
//! Session registry and process-state provider for a MongoDB
//! wire-protocol-compatible proxy.
//!
//! This crate holds the state shared by every request-handling worker:
//! the logical sessions clients attach to their commands, and the
//! process identity and runtime flags that are persisted across restarts
//! and exported to metrics.
//!
//! ## Features
//!
//! - **Session registry**: create-on-first-use, refresh, end/kill and idle
//!   expiry of logical sessions, with sharded locking
//! - **Process state**: copy-on-read snapshots, serialized updates with
//!   best-effort file persistence and coalesced change notifications
//! - **Metrics**: Prometheus collector over the current state
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use proxy_core::{Lsid, SessionRegistry, StateProvider};
//!
//! fn main() -> proxy_core::Result<()> {
//!     proxy_core::logging::try_init().ok();
//!
//!     // Process state persisted in ./data/state.json
//!     let state = Arc::new(StateProvider::open_dir("data")?);
//!     println!("instance {}", state.get().uuid);
//!
//!     // Every command carrying a session id refreshes it
//!     let sessions = SessionRegistry::new();
//!     let (_, created) = sessions.create_or_update(&Lsid::from("client-1"));
//!     assert!(created);
//!
//!     // Mutations are persisted and announced to subscribers
//!     state.update(|s| s.telemetry = Some(false))?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use error::{ProxyError, Result};
pub use handler::{CommandHandler, Request};
pub use session::{Lsid, SessionRecord, SessionRegistry, SessionState};
pub use state::{ProcessState, RuntimeFlag, StateProvider, Subscription};
