//! Process-wide gate spacing out calls to the upstream transcript source.
//!
//! Every upstream call, whatever key it is for, goes through the same
//! [`UpstreamThrottle`]. The last call's start time lives behind a single async
//! mutex; the guard is held across the read, the sleep and the write, so two
//! callers can never both observe a stale timestamp and skip the wait.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::observability::record_throttle_wait;

pub struct UpstreamThrottle {
    min_interval: Duration,
    /// `None` until the first call.
    last_call: Mutex<Option<Instant>>,
}

impl UpstreamThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until at least `min_interval` has passed since the previous caller
    /// proceeded, then record this caller's start time and return it.
    ///
    /// If the returned future is dropped while waiting, the guard is released
    /// without touching the timestamp.
    pub async fn acquire(&self) -> Instant {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!("⏳ Upstream throttle: waiting {}ms", wait.as_millis());
                record_throttle_wait(wait.as_secs_f64());
                sleep_until(ready_at).await;
            } else {
                record_throttle_wait(0.0);
            }
        }

        let started = Instant::now();
        *last_call = Some(started);
        started
    }

    /// Start time of the most recent call that got through.
    pub async fn last_call(&self) -> Option<Instant> {
        *self.last_call.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let throttle = UpstreamThrottle::new(Duration::from_secs(30));
        let before = Instant::now();
        throttle.acquire().await;
        assert!(before.elapsed() < Duration::from_secs(1));
        assert!(throttle.last_call().await.is_some());
    }

    #[tokio::test]
    async fn test_sequential_calls_are_spaced() {
        let interval = Duration::from_millis(80);
        let throttle = UpstreamThrottle::new(interval);
        let first = throttle.acquire().await;
        let second = throttle.acquire().await;
        assert!(second - first >= interval);
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let interval = Duration::from_millis(50);
        let throttle = Arc::new(UpstreamThrottle::new(interval));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move { throttle.acquire().await })
            })
            .collect();

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();

        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= interval,
                "calls only {:?} apart",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test]
    async fn test_abandoned_wait_leaves_timestamp_untouched() {
        let throttle = UpstreamThrottle::new(Duration::from_millis(200));
        let first = throttle.acquire().await;

        let abandoned = tokio::time::timeout(Duration::from_millis(20), throttle.acquire()).await;
        assert!(abandoned.is_err());
        assert_eq!(throttle.last_call().await, Some(first));

        let next = throttle.acquire().await;
        assert!(next - first >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let throttle = UpstreamThrottle::new(Duration::ZERO);
        let before = Instant::now();
        for _ in 0..10 {
            throttle.acquire().await;
        }
        assert!(before.elapsed() < Duration::from_secs(1));
    }
}
