//! Shutdown coordination.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals::wait_for_signal;

/// Broadcasts a single shutdown event to the accept loop and every live
/// connection.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the event. Returns how many receivers were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Trigger once SIGINT or SIGTERM arrives.
    pub fn trigger_on_signal(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            tracing::info!(signal, "Shutdown requested");
            shutdown.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_the_trigger() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();

        assert_eq!(shutdown.trigger(), 2);
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn trigger_without_subscribers_is_harmless() {
        assert_eq!(Shutdown::new().trigger(), 0);
    }
}
