use crate::{Result, SorterError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cooperative cancellation support for long-running runs.
///
/// This is intentionally simple:
/// - `cancel()` flips a boolean and wakes sleepers.
/// - `reset()` clears the flag so future operations can run again.
/// - An optional deadline turns into `DeadlineExceeded` at the next check.
/// - Processors call `check()` between pages and batches, never mid-call.
#[derive(Clone, Debug)]
pub struct CancellationState {
    tx: watch::Sender<bool>,
    deadline: Option<Instant>,
}

impl Default for CancellationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx, deadline: None }
    }

    /// A state that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Attach a deadline. Clones share the cancel flag but carry their own deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn reset(&self) {
        let _ = self.tx.send(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Fail if the run was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(SorterError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SorterError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Sleep for `duration`, waking early with an error on cancellation or deadline.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.check()?;
        if let Some(deadline) = self.deadline {
            let now = Instant::now();
            if now + duration > deadline {
                sleep_with_cancel(self.subscribe(), deadline - now).await?;
                return Err(SorterError::DeadlineExceeded);
            }
        }
        sleep_with_cancel(self.subscribe(), duration).await
    }
}

pub async fn sleep_with_cancel(
    mut cancel_rx: watch::Receiver<bool>,
    duration: Duration,
) -> Result<()> {
    if *cancel_rx.borrow() {
        return Err(SorterError::Cancelled);
    }

    let sleeper = tokio::time::sleep(duration);
    tokio::pin!(sleeper);
    tokio::select! {
        _ = &mut sleeper => Ok(()),
        _ = async {
            loop {
                if cancel_rx.changed().await.is_err() {
                    // Sender dropped; treat as non-cancelable.
                    std::future::pending::<()>().await;
                }
                if *cancel_rx.borrow() {
                    break;
                }
            }
        } => Err(SorterError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_cancellation() {
        let state = CancellationState::new();
        assert!(state.check().is_ok());
        state.cancel();
        assert!(matches!(state.check(), Err(SorterError::Cancelled)));
        state.reset();
        assert!(state.check().is_ok());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let state = CancellationState::new();
        let clone = state.clone();
        clone.cancel();
        assert!(state.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let state = CancellationState::with_timeout(Duration::from_secs(5));
        assert!(state.check().is_ok());
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(matches!(state.check(), Err(SorterError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_stops_at_deadline() {
        let state = CancellationState::with_timeout(Duration::from_secs(2));
        let result = state.sleep(Duration::from_secs(60)).await;
        assert!(matches!(result, Err(SorterError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_sleep_wakes_on_cancel() {
        let state = CancellationState::new();
        let canceller = state.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let result = state.sleep(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(SorterError::Cancelled)));
        handle.await.unwrap();
    }
}
