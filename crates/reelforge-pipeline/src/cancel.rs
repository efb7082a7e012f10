//! Cooperative cancellation.
//!
//! The orchestrator checks a cancellation token at every suspension point
//! and races it against in-flight external calls with `tokio::select!`, so
//! no response is applied after cancellation.

use tokio::sync::watch;

/// Sender half: the orchestrator holds this and flips it on `cancel()`.
#[derive(Debug)]
pub struct CancelSignal {
    tx: watch::Sender<bool>,
}

impl CancelSignal {
    /// Create a fresh, uncancelled signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Reset before a new run so a stale cancel does not abort it.
    pub fn reset(&self) {
        let _ = self.tx.send(false);
    }

    /// Subscribe a token for one run.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver half, threaded through the run loop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Synchronous check at a suspension point.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when cancellation is requested. Never resolves if the signal
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
