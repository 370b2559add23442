//! Abort signalling for in-flight attempts.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;

/// Why an attempt was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The per-attempt timeout expired.
    Timeout(Duration),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Timeout(limit) => write!(f, "attempt timed out after {:?}", limit),
        }
    }
}

/// Owner side of an abort signal.
///
/// One controller is created per attempt. Every [`AbortSignal`] handed out
/// observes the first reason passed to [`AbortController::abort`]; later
/// calls are ignored.
pub struct AbortController {
    tx: watch::Sender<Option<AbortReason>>,
}

impl AbortController {
    /// Create a controller that has not fired yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Hand out a signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Returns false if it had already fired.
    pub fn abort(&self, reason: AbortReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AbortController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortController")
            .field("reason", &*self.tx.borrow())
            .finish()
    }
}

/// Observer side of an abort signal, passed to the transport.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<Option<AbortReason>>,
}

impl AbortSignal {
    /// Reason the signal fired with, if it has.
    pub fn reason(&self) -> Option<AbortReason> {
        *self.rx.borrow()
    }

    pub fn is_aborted(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until the signal fires.
    ///
    /// Never completes if the controller is dropped without aborting.
    pub async fn aborted(&self) -> AbortReason {
        let mut rx = self.rx.clone();
        let reason = rx.wait_for(Option::is_some).await.ok().and_then(|r| *r);
        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_observes_first_reason() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        let first = AbortReason::Timeout(Duration::from_millis(10));
        assert!(controller.abort(first));
        assert!(!controller.abort(AbortReason::Timeout(Duration::from_secs(1))));

        assert_eq!(signal.reason(), Some(first));
        assert_eq!(signal.aborted().await, first);
    }

    #[tokio::test]
    async fn test_waiting_signal_wakes_on_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        tokio::task::yield_now().await;
        controller.abort(AbortReason::Timeout(Duration::from_millis(5)));

        let reason = waiter.await.unwrap();
        assert_eq!(reason, AbortReason::Timeout(Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn test_dropped_controller_never_fires() {
        let controller = AbortController::new();
        let signal = controller.signal();
        drop(controller);

        let waited = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(waited.is_err());
        assert!(!signal.is_aborted());
    }
}
