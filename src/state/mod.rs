//! Process state module.
//!
//! This module owns the identity and runtime flags of the running process:
//! the value type, its on-disk form, change notifications and the
//! thread-safe provider tying them together.

mod hub;
mod metrics;
mod process;
mod provider;
pub mod store;
mod watcher;

pub use hub::{Subscription, SubscriptionHub};
pub use metrics::StateCollector;
pub use process::{ProcessState, RuntimeFlag};
pub use provider::{StateProvider, StateVar, STATE_FILE_NAME};
pub use watcher::spawn_state_watcher;
