//! Shutdown coordination for background tasks.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks hold a [`ShutdownHandle`] and race their work against
/// [`ShutdownHandle::wait`]. Triggering is idempotent.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a handle for one background task.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal all handles. Tasks already gone are fine.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A task's view of the shutdown signal.
pub struct ShutdownHandle {
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    /// Resolves once shutdown has been triggered (or the coordinator is gone).
    pub async fn wait(&mut self) {
        // An Err means the sender was dropped, which is shutdown too.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
