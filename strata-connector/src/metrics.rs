//! Per-connector counters, mirroring `BaseConnector`'s `self.metrics` dict.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ConnectorMetrics {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    syncs_total: AtomicU64,
    webhooks_total: AtomicU64,
}

impl ConnectorMetrics {
    pub fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sync(&self) {
        self.syncs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook(&self) {
        self.webhooks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn syncs_total(&self) -> u64 {
        self.syncs_total.load(Ordering::Relaxed)
    }

    pub fn webhooks_total(&self) -> u64 {
        self.webhooks_total.load(Ordering::Relaxed)
    }
}
