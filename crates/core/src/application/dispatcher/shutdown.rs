// Shutdown signalling for background loops

use tokio::sync::watch;

/// Receiving side, cloned into every loop that must stop
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is signalled or the sender is dropped
    pub async fn wait(&mut self) {
        // wait_for also returns immediately when the flag is already set
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Sending side, owned by the composition root
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Hand out another token for a loop started later
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
