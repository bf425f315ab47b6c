/*
[INPUT]:  Rapid invocations (filter input edits) with their latest arguments
[OUTPUT]: One delayed action call per quiet period
[POS]:    Utility layer - coalesces input bursts before a session restart
[UPDATE]: When changing timer ownership or cancellation semantics
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period for filter edits
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(250);

/// Delays an action until calls stop arriving for `wait`.
///
/// Every call reschedules the timer; only the last arguments reach the
/// action. The timer is a spawned task, so `call` must run inside a Tokio
/// runtime.
pub struct Debouncer<T> {
    wait: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(wait: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            wait,
            action: Arc::new(action),
            pending: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Schedule the action with `args`, replacing any pending call
    pub fn call(&mut self, args: T) {
        self.cancel();

        let action = Arc::clone(&self.action);
        let wait = self.wait;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            action(args);
        }));
    }

    /// Drop the pending call, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn recorder() -> (
        impl Fn(u32) + Send + Sync + 'static,
        mpsc::UnboundedReceiver<u32>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |value| {
                let _ = tx.send(value);
            },
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_with_last_arguments() {
        let (action, mut rx) = recorder();
        let mut debouncer = Debouncer::new(FILTER_DEBOUNCE, action);

        for value in 0..5 {
            debouncer.call(value);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(rx.recv().await, Some(4));
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_calls_fire_separately() {
        let (action, mut rx) = recorder();
        let mut debouncer = Debouncer::new(FILTER_DEBOUNCE, action);

        debouncer.call(1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.call(2);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_discard_pending_call() {
        let (action, mut rx) = recorder();
        let mut debouncer = Debouncer::new(FILTER_DEBOUNCE, action);

        debouncer.call(1);
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        debouncer.call(2);
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_wait_fires_on_next_turn() {
        let (action, mut rx) = recorder();
        let mut debouncer = Debouncer::new(Duration::ZERO, action);

        debouncer.call(7);
        assert!(rx.try_recv().is_err());
        assert_eq!(rx.recv().await, Some(7));
    }
}
