//! Cross-tier operation counters, grounded on `MemoryMetrics` in
//! `unified_memory_router.py`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct MemoryMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl MemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&self, cache_hit: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_write(&self, count: u64) {
        self.writes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f64;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn searches(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_rate_with_no_reads_is_zero() {
        let m = MemoryMetrics::new();
        assert_eq!(m.cache_hit_rate(), 0.0);
    }

    #[test]
    fn cache_hit_rate_tracks_hits_and_misses() {
        let m = MemoryMetrics::new();
        m.record_read(true);
        m.record_read(true);
        m.record_read(false);
        assert!((m.cache_hit_rate() - 0.666_666_7).abs() < 1e-4);
    }
}
