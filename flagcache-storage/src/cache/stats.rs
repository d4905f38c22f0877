//! Cache usage counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a loaded entry.
    pub hits: u64,
    /// Lookups that claimed a pair and fetched it.
    pub misses: u64,
    /// Times a caller blocked on another caller's fetch.
    pub waits: u64,
    /// Fetches that returned an error.
    pub fetch_failures: u64,
    /// Fetches that panicked.
    pub fetch_panics: u64,
    /// Tenants with a state map.
    pub tenants: u64,
    /// Pairs in the loaded state.
    pub loaded_entries: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    waits: AtomicU64,
    fetch_failures: AtomicU64,
    fetch_panics: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self) {
        self.fetch_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, tenants: usize, loaded_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            fetch_panics: self.fetch_panics.load(Ordering::Relaxed),
            tenants: tenants as u64,
            loaded_entries: loaded_entries as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_wait();
        counters.record_failure();
        counters.record_panic();

        let stats = counters.snapshot(3, 5);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.waits, 1);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.fetch_panics, 1);
        assert_eq!(stats.tenants, 3);
        assert_eq!(stats.loaded_entries, 5);
    }
}
