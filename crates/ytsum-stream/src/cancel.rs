//! Cooperative cancellation for streams.

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of a cancellation flag.
///
/// Cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// A signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of a cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// If every handle is dropped without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_signal() {
        let handle = CancelHandle::new();
        let mut signal = handle.signal();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
        });
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_signal_created_after_cancel_fires_immediately() {
        let handle = CancelHandle::new();
        handle.cancel();
        let mut signal = handle.signal();
        assert!(signal.is_cancelled());
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_never_stays_pending() {
        let mut signal = CancelSignal::never();
        let res = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
        assert!(res.is_err());
        assert!(!signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_stays_pending() {
        let handle = CancelHandle::new();
        let mut signal = handle.signal();
        drop(handle);
        let res = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
        assert!(res.is_err());
    }
}
