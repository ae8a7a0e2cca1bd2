use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Serialize, Deserialize};

/// Executor counters for monitoring. Shared read-mostly; all fields
/// are updated with relaxed atomics since they are advisory only.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub queries: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub saturated_scores: AtomicU64,
    pub mirror_calls: AtomicU64,
    pub cancelled_queries: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        EngineStats::default()
    }

    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_saturation(&self) {
        self.saturated_scores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mirror_call(&self) {
        self.mirror_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancelled_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            saturated_scores: self.saturated_scores.load(Ordering::Relaxed),
            mirror_calls: self.mirror_calls.load(Ordering::Relaxed),
            cancelled_queries: self.cancelled_queries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub saturated_scores: u64,
    pub mirror_calls: u64,
    pub cancelled_queries: u64,
}
