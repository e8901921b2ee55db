//! Shutdown coordination for a shard round.

use tokio::sync::broadcast;

/// Coordinator for cooperative cancellation.
///
/// The probe scheduler subscribes and stops issuing lookups when triggered;
/// rules left unprobed are deferred to the next round.
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

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger on the first Ctrl-C. Runs until the signal arrives.
    pub async fn listen_for_ctrl_c(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, finishing round with probed rules only");
                self.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
