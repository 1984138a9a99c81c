//! Cooperative cancellation shared by every task of one generation.

use tokio::sync::watch;

/// Sender side of a generation's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

/// Receiver side, cloned into every in-flight task and retry sleep.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair.
pub fn cancellation_pair() -> (CancellationHandle, CancellationSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancellationHandle { sender }, CancellationSignal { receiver })
}

impl CancellationHandle {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal fires. Pends forever if the handle is dropped unfired.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let (handle, signal) = cancellation_pair();
        let waiter = tokio::spawn(async move { signal.cancelled().await });
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_never_fires() {
        let (handle, signal) = cancellation_pair();
        drop(handle);
        let outcome = tokio::time::timeout(Duration::from_secs(5), signal.cancelled()).await;
        assert!(outcome.is_err());
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn signals_from_handle_observe_cancel() {
        let (handle, _signal) = cancellation_pair();
        let late = handle.signal();
        handle.cancel();
        assert!(late.is_cancelled());
    }
}
