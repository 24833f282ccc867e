//! # strata-breaker — generic circuit breaker
//!
//! A named primitive with three states — closed, open, half-open — used by
//! `strata-provider` (one breaker per route), `strata-connector` (one per
//! connector), and `strata-orchestrator` (one per orchestrator instance) to
//! stop calling a failing dependency until it has had time to recover.
//!
//! Thread-safety follows the pack's own atomics-first breaker precedent,
//! generalized to three states and parametrized thresholds: state lives
//! behind a single `tokio::sync::RwLock` rather than bespoke atomics per
//! field, since the state machine here has more than one mutable field that
//! must change together.

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Current state of a [`CircuitBreaker`], exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in `Closed` before tripping to `Open`.
    pub failure_threshold: u32,
    /// Consecutive successes in `HalfOpen` before closing. Does not apply
    /// in `Closed` (spec's open question, resolved: half-open only).
    pub success_threshold: u32,
    /// How long `Open` blocks calls before admitting a half-open probe.
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BreakerError<E> {
    /// The circuit is open (or a half-open probe is already in flight); the
    /// underlying call was never invoked.
    #[error("circuit '{name}' is open")]
    Open { name: String },

    /// The underlying call ran and returned an error.
    #[error(transparent)]
    Inner(#[from] E),
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
    half_open_inflight: bool,
}

/// A named failure-isolation primitive. Cheap to clone (wrap in `Arc`) and
/// safe to share across tasks.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: RwLock::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
                half_open_inflight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> BreakerState {
        self.inner.read().await.state
    }

    /// Runs `f`, treating every `Err` it returns as a breaker failure.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with_classifier(f, |_| true).await
    }

    /// Runs `f`, classifying which `Err`s count as breaker failures via
    /// `is_expected`. An error for which `is_expected` returns `false`
    /// propagates without affecting breaker state, matching spec's "other
    /// exceptions propagate without affecting state."
    pub async fn call_with_classifier<F, Fut, T, E>(
        &self,
        f: F,
        is_expected: impl Fn(&E) -> bool,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Err(()) = self.try_admit().await {
            return Err(BreakerError::Open {
                name: self.name.clone(),
            });
        }

        let outcome = f().await;

        match &outcome {
            Ok(_) => self.record_success().await,
            Err(e) if is_expected(e) => self.record_failure().await,
            Err(_) => self.release_half_open_slot().await,
        }

        outcome.map_err(BreakerError::Inner)
    }

    async fn try_admit(&self) -> Result<(), ()> {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.open_timeout)
                    .unwrap_or(false);
                if elapsed {
                    tracing::info!(breaker = %self.name, "open_timeout elapsed, admitting half-open probe");
                    inner.state = BreakerState::HalfOpen;
                    inner.consecutive_successes = 0;
                    inner.half_open_inflight = true;
                    Ok(())
                } else {
                    Err(())
                }
            }
            BreakerState::HalfOpen => {
                if inner.half_open_inflight {
                    Err(())
                } else {
                    inner.half_open_inflight = true;
                    Ok(())
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
            }
            BreakerState::HalfOpen => {
                inner.half_open_inflight = false;
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    tracing::info!(breaker = %self.name, "half-open probes succeeded, closing circuit");
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    inner.consecutive_successes = 0;
                }
            }
            BreakerState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(breaker = %self.name, failures = inner.consecutive_failures, "tripping circuit open");
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen => {
                tracing::warn!(breaker = %self.name, "half-open probe failed, re-opening circuit");
                inner.half_open_inflight = false;
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.consecutive_failures = 0;
                inner.consecutive_successes = 0;
            }
            BreakerState::Open => {}
        }
    }

    async fn release_half_open_slot(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == BreakerState::HalfOpen {
            inner.half_open_inflight = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(threshold: u32, success: u32, timeout: Duration) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            success_threshold: success,
            open_timeout: timeout,
        }
    }

    #[tokio::test]
    async fn trips_open_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new("test", config(3, 2, Duration::from_secs(60)));
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let result: Result<(), BreakerError<&str>> = breaker
                .call(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("boom") }
                })
                .await;
            assert!(matches!(result, Err(BreakerError::Inner(_))));
        }
        assert_eq!(breaker.state().await, BreakerState::Open);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // The (T+1)th call short-circuits without invoking the function.
        let result: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(BreakerError::Open { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn admits_half_open_probe_after_timeout_then_closes() {
        let breaker = CircuitBreaker::new("test", config(1, 1, Duration::from_millis(20)));

        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        assert_eq!(breaker.state().await, BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let result: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_circuit() {
        let breaker = CircuitBreaker::new("test", config(1, 2, Duration::from_millis(10)));
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail again") }).await;
        assert!(matches!(result, Err(BreakerError::Inner(_))));
        assert_eq!(breaker.state().await, BreakerState::Open);
    }

    #[tokio::test]
    async fn success_threshold_requires_consecutive_successes_in_half_open() {
        let breaker = CircuitBreaker::new("test", config(1, 2, Duration::from_millis(10)));
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
        assert_eq!(breaker.state().await, BreakerState::HalfOpen);

        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn unexpected_errors_do_not_trip_the_circuit() {
        let breaker = CircuitBreaker::new("test", config(1, 1, Duration::from_secs(60)));
        for _ in 0..5 {
            let result: Result<(), BreakerError<&str>> = breaker
                .call_with_classifier(|| async { Err("ignored") }, |_| false)
                .await;
            assert!(matches!(result, Err(BreakerError::Inner(_))));
        }
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn success_in_closed_state_resets_failure_counter() {
        let breaker = CircuitBreaker::new("test", config(3, 1, Duration::from_secs(60)));
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
        // Two more failures should not trip it, since the counter reset.
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        let _: Result<(), BreakerError<&str>> = breaker.call(|| async { Err("fail") }).await;
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }
}
