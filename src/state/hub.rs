//! Fan-out of coalesced "state changed" notifications.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Receiving side of a state-change subscription.
///
/// Holds at most one pending notification; several changes made while the
/// consumer is busy collapse into one. Consumers re-read the full state on
/// wake instead of inferring what changed. Dropping the subscription
/// unregisters it.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<()>,
}

impl Subscription {
    /// Wait for the next notification.
    ///
    /// Returns `false` once the provider has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Take a pending notification without waiting.
    pub fn try_changed(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }
}

/// Set of registered subscribers.
#[derive(Debug, Default)]
pub struct SubscriptionHub {
    subscribers: Vec<mpsc::Sender<()>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber with one notification already pending.
    pub fn register(&mut self) -> Subscription {
        let (tx, rx) = mpsc::channel(1);
        // capacity is 1 and the channel is fresh
        let _ = tx.try_send(());
        self.subscribers.push(tx);
        Subscription { rx }
    }

    /// Notify every subscriber without blocking.
    ///
    /// Subscribers that already have a pending notification are skipped;
    /// subscribers whose receiver was dropped are forgotten.
    pub fn notify_all(&mut self) {
        self.subscribers.retain(|tx| match tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        });
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
