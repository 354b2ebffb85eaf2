//! Request spacing
//!
//! Uses the governor crate with a one-cell bucket so that consecutive
//! requests through one client are at least `min_interval` apart.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Default spacing between requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum-spacing throttle shared by clones of a client
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    min_interval: Duration,
}

impl Throttle {
    /// Create a throttle; a zero interval is clamped to one nanosecond
    pub fn new(min_interval: Duration) -> Self {
        let period = min_interval.max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(Governor::direct(quota)),
            min_interval,
        }
    }

    /// Wait until the next request may go out
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take the slot if it is free right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod throttle_tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_default_interval() {
        assert_eq!(Throttle::default().min_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_no_burst() {
        let throttle = Throttle::new(Duration::from_secs(60));

        assert!(throttle.try_acquire());
        // Second slot only opens after the interval
        assert!(!throttle.try_acquire());
    }

    #[tokio::test]
    async fn test_wait_spaces_calls() {
        let throttle = Throttle::new(Duration::from_millis(30));
        let start = Instant::now();

        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;

        // governor and std clocks are read separately, allow a hair of drift
        assert!(start.elapsed() >= Duration::from_millis(59));
    }

    #[test]
    fn test_clones_share_state() {
        let throttle = Throttle::new(Duration::from_secs(60));
        let clone = throttle.clone();

        assert!(throttle.try_acquire());
        assert!(!clone.try_acquire());
    }
}
