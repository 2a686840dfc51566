//! Timers and background fetches owned by a screen. Both stop when the
//! owning screen drops them.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Recurring timer. The first tick fires one period after creation.
#[derive(Debug)]
pub struct Ticker {
    interval: Option<Interval>,
    period: Duration,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ticker {
            interval: Some(interval),
            period,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_cancelled(&self) -> bool {
        self.interval.is_none()
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Waits for the next tick. Never resolves once cancelled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Spawned task that is aborted when dropped.
#[derive(Debug)]
pub struct ScopedTask<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> ScopedTask<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        ScopedTask {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> Future for ScopedTask<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx)
    }
}

impl<T> Drop for ScopedTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ticker_fires_each_period() {
        let start = Instant::now();
        let mut ticker = Ticker::from_millis(3000);

        ticker.tick().await;
        let first = start.elapsed();
        assert!(first >= Duration::from_millis(3000) && first < Duration::from_millis(3100));
        ticker.tick().await;
        let second = start.elapsed();
        assert!(second >= Duration::from_millis(6000) && second < Duration::from_millis(6100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_ticker_never_fires() {
        let mut ticker = Ticker::from_millis(10);
        ticker.cancel();
        assert!(ticker.is_cancelled());

        let result = tokio::time::timeout(Duration::from_secs(60), ticker.tick()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoped_task_yields_result() {
        let task = ScopedTask::spawn(async { 41 + 1 });
        assert_eq!(task.await.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_task_is_aborted() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let task = ScopedTask::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
        });

        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
