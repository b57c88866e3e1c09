//! Upload cancellation
//!
//! An [`AbortHandle`] is held by whatever owns the inbound connection; the
//! matching [`AbortSignal`] is handed to the upload adapter and resolves once
//! the transfer has been cancelled.

use tokio::sync::watch;

/// Create a connected handle/signal pair
pub fn abort_channel() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// Upstream side: signals that the inbound transfer was aborted
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Consumer side of an abort notification.
///
/// Dropping the [`AbortHandle`] without calling `abort` leaves the signal
/// pending forever.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, signal) = abort_channel();
        signal
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the transfer is aborted
    pub async fn aborted(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without aborting
                std::future::pending::<()>().await;
            }
        }
    }
}
