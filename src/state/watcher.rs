//! Logging subscriber for process state changes.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::StateProvider;

/// Spawn a task that logs the process state every time it changes.
///
/// The first notification is delivered immediately, so the initial state is
/// logged at startup. The task ends when the provider is dropped.
pub fn spawn_state_watcher(provider: &Arc<StateProvider>) -> JoinHandle<()> {
    let mut subscription = provider.subscribe();
    let provider = Arc::downgrade(provider);

    tokio::spawn(async move {
        while subscription.changed().await {
            let Some(provider) = provider.upgrade() else {
                break;
            };

            let state = provider.get();
            info!(
                uuid = %state.uuid,
                telemetry = state.telemetry_string(),
                telemetry_locked = state.telemetry_locked,
                update_available = state.update_available,
                "Process state changed"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_watcher_stops_with_provider() {
        let provider = Arc::new(StateProvider::new(None));
        let handle = spawn_state_watcher(&provider);

        provider.update(|s| s.telemetry = Some(true)).unwrap();
        drop(provider);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }
}
