//! Graceful shutdown fan-out.

use tokio::sync::broadcast;

/// Cloneable handle telling the HTTP server, and anything else subscribed, to stop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            notify: broadcast::channel(1).0,
        }
    }

    /// A receiver that resolves once [`Shutdown::trigger`] is called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Notify every subscriber. Harmless with no subscribers or when repeated.
    pub fn trigger(&self) {
        if self.notify.send(()).is_err() {
            tracing::debug!("Shutdown triggered with nobody listening");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
