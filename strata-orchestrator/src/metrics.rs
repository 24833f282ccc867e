//! Rolling-window task outcome tracking plus simple counters — the
//! "Evolution / Analysis" ambient share from the platform's component
//! table, scoped to what this crate can own without inventing a new named
//! component: a bounded success-rate window and total/duration/cost
//! counters, mirroring the shape of `MetricsCollector.increment`/`.record`
//! calls in `base_orchestrator.py`'s `finally` block.

use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub struct OrchestratorMetrics {
    window: Mutex<VecDeque<bool>>,
    window_capacity: usize,
    tasks_total: AtomicU64,
    tasks_succeeded: AtomicU64,
    total_duration_ms: Mutex<f64>,
    total_cost_usd: Mutex<Decimal>,
}

impl OrchestratorMetrics {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(window_capacity)),
            window_capacity,
            tasks_total: AtomicU64::new(0),
            tasks_succeeded: AtomicU64::new(0),
            total_duration_ms: Mutex::new(0.0),
            total_cost_usd: Mutex::new(Decimal::ZERO),
        }
    }

    pub async fn record(&self, success: bool, duration_ms: f64, cost: Decimal) {
        self.tasks_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        }

        let mut window = self.window.lock().await;
        if window.len() >= self.window_capacity {
            window.pop_front();
        }
        window.push_back(success);
        drop(window);

        *self.total_duration_ms.lock().await += duration_ms;
        *self.total_cost_usd.lock().await += cost;
    }

    /// Success rate over the last `window_capacity` recorded outcomes.
    /// `1.0` with an empty window, matching the "no data yet" convention
    /// used elsewhere (e.g. `MemoryMetrics::cache_hit_rate`'s "no reads ⇒
    /// 0.0" is the inverse convention — here an empty window means nothing
    /// has failed yet either, so 1.0 rather than 0.0).
    pub async fn rolling_success_rate(&self) -> f64 {
        let window = self.window.lock().await;
        if window.is_empty() {
            return 1.0;
        }
        window.iter().filter(|ok| **ok).count() as f64 / window.len() as f64
    }

    pub fn tasks_total(&self) -> u64 {
        self.tasks_total.load(Ordering::Relaxed)
    }

    pub fn tasks_succeeded(&self) -> u64 {
        self.tasks_succeeded.load(Ordering::Relaxed)
    }

    pub async fn total_duration_ms(&self) -> f64 {
        *self.total_duration_ms.lock().await
    }

    pub async fn total_cost_usd(&self) -> Decimal {
        *self.total_cost_usd.lock().await
    }
}
