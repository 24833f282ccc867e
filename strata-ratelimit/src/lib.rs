//! # strata-ratelimit — outbound call throttling
//!
//! Two strategies, picked per limiter at construction: [`Strategy::SlidingWindow`]
//! evicts timestamps older than the window and admits while under `max_calls`;
//! [`Strategy::TokenBucket`] refills continuously at `max_calls / period` and
//! admits while at least one token is available. Both mirror the dual-strategy
//! limiter the connector runtime's source leans on.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SlidingWindow,
    TokenBucket,
}

struct SlidingWindowState {
    call_times: Vec<Instant>,
}

struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
}

enum State {
    SlidingWindow(SlidingWindowState),
    TokenBucket(TokenBucketState),
}

/// A single named throttle: `max_calls` admitted per `period`.
pub struct RateLimiter {
    max_calls: u32,
    period: Duration,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, period: Duration, strategy: Strategy) -> Self {
        let state = match strategy {
            Strategy::SlidingWindow => State::SlidingWindow(SlidingWindowState {
                call_times: Vec::new(),
            }),
            Strategy::TokenBucket => State::TokenBucket(TokenBucketState {
                tokens: max_calls as f64,
                last_refill: Instant::now(),
            }),
        };
        Self {
            max_calls,
            period,
            state: Mutex::new(state),
        }
    }

    /// Non-blocking: returns `true` if a call may proceed right now, and
    /// records it if so.
    pub async fn acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        match &mut *state {
            State::SlidingWindow(s) => {
                let now = Instant::now();
                let cutoff = now.checked_sub(self.period).unwrap_or(now);
                s.call_times.retain(|t| *t > cutoff);
                if s.call_times.len() < self.max_calls as usize {
                    s.call_times.push(now);
                    true
                } else {
                    false
                }
            }
            State::TokenBucket(s) => {
                let now = Instant::now();
                let elapsed = now.duration_since(s.last_refill).as_secs_f64();
                let refill_rate = self.max_calls as f64 / self.period.as_secs_f64();
                s.tokens = (s.tokens + elapsed * refill_rate).min(self.max_calls as f64);
                s.last_refill = now;

                if s.tokens >= 1.0 {
                    s.tokens -= 1.0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Blocks, polling every second, until a call is admitted.
    pub async fn wait_if_needed(&self) {
        while !self.acquire().await {
            tracing::debug!(max_calls = self.max_calls, "rate limit reached, waiting");
            sleep(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sliding_window_admits_up_to_max_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), Strategy::SlidingWindow);
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(!limiter.acquire().await);
    }

    #[tokio::test]
    async fn sliding_window_admits_again_after_period_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20), Strategy::SlidingWindow);
        assert!(limiter.acquire().await);
        assert!(!limiter.acquire().await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.acquire().await);
    }

    #[tokio::test]
    async fn token_bucket_starts_full_and_depletes() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60), Strategy::TokenBucket);
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(!limiter.acquire().await);
    }

    #[tokio::test]
    async fn token_bucket_refills_over_time() {
        let limiter = RateLimiter::new(10, Duration::from_millis(100), Strategy::TokenBucket);
        for _ in 0..10 {
            assert!(limiter.acquire().await);
        }
        assert!(!limiter.acquire().await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.acquire().await);
    }

    #[tokio::test]
    async fn wait_if_needed_eventually_admits() {
        let limiter = RateLimiter::new(1, Duration::from_millis(1), Strategy::SlidingWindow);
        limiter.wait_if_needed().await;
        // Will need to wait ~1s for the second since the poll granularity is
        // 1s; we only assert the first call is immediate and doesn't hang.
    }
}
