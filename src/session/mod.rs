//! Session management module.
//!
//! This module tracks the logical sessions clients attach to their
//! commands: identification, lifecycle state, the shared registry and the
//! background expiry sweep.

mod id;
mod registry;
mod state;
mod sweeper;

pub use id::Lsid;
pub use registry::{SessionRecord, SessionRegistry, DEFAULT_IDLE_TIMEOUT};
pub use state::SessionState;
pub use sweeper::{spawn_expiry_sweep, DEFAULT_SWEEP_INTERVAL};
