use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::MonitorError;

/// Cloneable stop flag. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`Shutdown::trigger`] has been called, immediately if it
    /// already was.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Registers for SIGINT right away and triggers on the first one.
    pub fn listen_for_interrupt(&self) -> Result<JoinHandle<()>, MonitorError> {
        let mut interrupt = signal(SignalKind::interrupt()).map_err(MonitorError::Signal)?;
        let shutdown = self.clone();
        Ok(tokio::spawn(async move {
            if interrupt.recv().await.is_some() {
                info!("Interrupt received");
                shutdown.trigger();
            }
        }))
    }
}
