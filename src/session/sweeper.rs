//! Background expiry of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::SessionRegistry;

/// Default period between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a task that periodically removes idle sessions.
///
/// The task only holds a weak reference and stops on its own once the
/// registry is dropped. Must be called within a tokio runtime.
pub fn spawn_expiry_sweep(registry: &Arc<SessionRegistry>, period: Duration) -> JoinHandle<()> {
    let registry = Arc::downgrade(registry);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(registry) = registry.upgrade() else {
                debug!("Expiry sweep stopping: registry dropped");
                break;
            };

            let expired = registry.expire_idle();
            if !expired.is_empty() {
                info!(
                    count = expired.len(),
                    remaining = registry.len(),
                    "Expired idle sessions"
                );
            }
        }
    })
}
