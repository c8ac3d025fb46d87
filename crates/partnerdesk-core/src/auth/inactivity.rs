//! Inactivity countdown.
//!
//! A single countdown that restarts on every `record_activity()` call and
//! fires once after a quiet period. It has no knowledge of where activity
//! comes from; front ends call `record_activity()` on whatever input they see.
//! After firing, the countdown re-arms on the next recorded activity.
//!
//! Built on `tokio::time`, so tests drive it with a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Quiet period after which an authenticated session is ended.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct InactivityMonitor {
    last_activity: watch::Sender<Instant>,
    timeout: Duration,
}

impl InactivityMonitor {
    pub fn new(timeout: Duration) -> Self {
        let (last_activity, _) = watch::channel(Instant::now());
        Self {
            last_activity,
            timeout,
        }
    }

    /// Restart the countdown from now.
    pub fn record_activity(&self) {
        self.last_activity.send_replace(Instant::now());
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.borrow()
    }

    /// Time left before the countdown fires, measured from the last activity.
    pub fn remaining(&self) -> Duration {
        (self.last_activity() + self.timeout).saturating_duration_since(Instant::now())
    }

    /// Spawn the countdown task. `on_idle` runs each time the quiet period
    /// elapses; returning `false` stops the task. The task also stops once
    /// the monitor is dropped.
    pub fn spawn<F, Fut>(&self, on_idle: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.record_activity();
        let activity = self.last_activity.subscribe();
        tokio::spawn(run_countdown(activity, self.timeout, on_idle))
    }
}

async fn run_countdown<F, Fut>(mut activity: watch::Receiver<Instant>, timeout: Duration, mut on_idle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    loop {
        let deadline = *activity.borrow_and_update() + timeout;

        tokio::select! {
            changed = activity.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                debug!(timeout_secs = timeout.as_secs(), "Inactivity timeout elapsed");
                if !on_idle().await {
                    break;
                }
                // Stay quiet until the user does something again.
                if activity.changed().await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Inactivity monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_monitor(timeout: Duration) -> (InactivityMonitor, Arc<AtomicUsize>, JoinHandle<()>) {
        let monitor = InactivityMonitor::new(timeout);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let handle = monitor.spawn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });
        (monitor, fired, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let (_monitor, fired, _handle) = counting_monitor(INACTIVITY_TIMEOUT);
        settle().await;

        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_restarts_countdown() {
        let (monitor, fired, _handle) = counting_monitor(INACTIVITY_TIMEOUT);
        settle().await;

        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        settle().await;
        monitor.record_activity();
        settle().await;

        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.remaining(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_until_next_activity() {
        let (monitor, fired, _handle) = counting_monitor(Duration::from_secs(60));
        settle().await;

        tokio::time::advance(Duration::from_secs(60 * 10)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        monitor.record_activity();
        settle().await;
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_monitor_dropped() {
        let (monitor, _fired, handle) = counting_monitor(INACTIVITY_TIMEOUT);
        settle().await;

        drop(monitor);
        settle().await;
        assert!(handle.is_finished());
    }
}
