use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use lru::LruCache;
use parking_lot::Mutex;
use crate::query::types::{QueryFlags, ResultSet};

/// Result cache for upstream-free query steps.
///
/// Entries are stamped with the deletion-filter generation they were
/// computed under; a stale stamp invalidates on lookup so the
/// deletion pass stays exact.
pub struct QueryCache {
    cache: Mutex<LruCache<QueryKey, CachedResult>>,
    capacity: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub text: String,
    pub field_rank: i64,
    pub flags: QueryFlags,
}

#[derive(Clone)]
struct CachedResult {
    result: Arc<ResultSet>,
    generation: u64,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("non-zero capacity");
        QueryCache {
            cache: Mutex::new(LruCache::new(cap)),
            capacity,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    /// Look up a result computed under `generation`; stale entries
    /// are evicted and count as misses.
    pub fn get(&self, key: &QueryKey, generation: u64) -> Option<Arc<ResultSet>> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some(entry) if entry.generation == generation => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                cache.pop(key);
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: QueryKey, result: Arc<ResultSet>, generation: u64) {
        let mut cache = self.cache.lock();
        cache.put(key, CachedResult { result, generation });
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;

    fn key(text: &str) -> QueryKey {
        QueryKey {
            text: text.to_string(),
            field_rank: 1,
            flags: QueryFlags::default(),
        }
    }

    fn result(doc_id: u32) -> Arc<ResultSet> {
        let mut set = ResultSet::new();
        set.insert(DocId(doc_id), 42);
        Arc::new(set)
    }

    #[test]
    fn hit_within_same_generation() {
        let cache = QueryCache::new(4);
        cache.put(key("q"), result(1), 7);
        assert!(cache.get(&key("q"), 7).is_some());
        assert_eq!(cache.stats().hit_count, 1);
    }

    #[test]
    fn stale_generation_invalidates() {
        let cache = QueryCache::new(4);
        cache.put(key("q"), result(1), 7);
        assert!(cache.get(&key("q"), 8).is_none());
        // Entry was evicted, not merely skipped.
        assert!(cache.get(&key("q"), 7).is_none());
    }

    #[test]
    fn lru_evicts_oldest() {
        let cache = QueryCache::new(2);
        cache.put(key("a"), result(1), 0);
        cache.put(key("b"), result(2), 0);
        cache.put(key("c"), result(3), 0);
        assert!(cache.get(&key("a"), 0).is_none());
        assert!(cache.get(&key("c"), 0).is_some());
    }
}
