//! Caching port for parsed ABI reuse.
//!
//! A [`crate::types::Abi`] row is parsed and indexed once
//! ([`crate::abi::AbiIndex`]) and then shared across every log a bound
//! [`crate::types::Source`] decodes. Parsing is cheap for a single call
//! but adds up at high log volume, so the control plane caches the
//! built index keyed by ABI id.

use std::sync::Arc;
use uuid::Uuid;

use crate::abi::AbiIndex;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for caching parsed, indexed ABIs.
///
/// # Cache Invalidation
///
/// Entries are keyed by `abi_id` and never mutated in place: if an
/// `Abi` row's JSON changes, callers must [`Self::invalidate`] the old
/// id (ABI rows are expected to be immutable in practice; this exists
/// for administrative corrections).
///
/// # Implementation Notes
///
/// Implementations should:
/// - Use TTL expiration per `cache.abi_ttl_ms`
/// - Use a capacity-bounded eviction policy per `cache.abi_max_capacity`
/// - Be thread-safe (this trait requires `Send + Sync`)
pub trait Cache: Send + Sync {
    /// Get a cached ABI index, if present and not expired.
    fn get(&self, abi_id: Uuid) -> Option<Arc<AbiIndex>>;

    /// Cache an ABI index.
    fn set(&self, abi_id: Uuid, index: Arc<AbiIndex>);

    /// Invalidate a single cached ABI index.
    fn invalidate(&self, abi_id: Uuid);

    /// Invalidate all cached ABI indexes.
    fn invalidate_all(&self);

    /// Get cache statistics for monitoring.
    fn stats(&self) -> CacheStats;
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of ABI indexes currently cached.
    pub entry_count: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate as a percentage.
    ///
    /// Precision loss in f64 conversion is acceptable for statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::significant_drop_tightening)]
pub mod mocks {
    //! Mock implementations for testing.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    use super::{Arc, Cache, CacheStats, Uuid};
    use crate::abi::AbiIndex;

    /// Simple in-memory cache for testing, with no TTL/capacity eviction.
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: RwLock<HashMap<Uuid, Arc<AbiIndex>>>,
        hits: AtomicU64,
        misses: AtomicU64,
    }

    impl MockCache {
        /// Create a new mock cache.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Cache for MockCache {
        fn get(&self, abi_id: Uuid) -> Option<Arc<AbiIndex>> {
            let entries = self.entries.read().expect("lock poisoned");
            match entries.get(&abi_id) {
                Some(index) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(Arc::clone(index))
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        }

        fn set(&self, abi_id: Uuid, index: Arc<AbiIndex>) {
            self.entries.write().expect("lock poisoned").insert(abi_id, index);
        }

        fn invalidate(&self, abi_id: Uuid) {
            self.entries.write().expect("lock poisoned").remove(&abi_id);
        }

        fn invalidate_all(&self) {
            self.entries.write().expect("lock poisoned").clear();
        }

        fn stats(&self) -> CacheStats {
            CacheStats {
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
                entry_count: self.entries.read().expect("lock poisoned").len(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockCache;
    use super::*;
    use alloy::json_abi::JsonAbi;

    fn empty_index() -> Arc<AbiIndex> {
        let abi: JsonAbi = serde_json::from_value(serde_json::json!([])).expect("valid empty ABI");
        Arc::new(AbiIndex::build(&abi, "Empty"))
    }

    #[test]
    fn cache_stats_hit_rate() {
        let stats = CacheStats { hits: 80, misses: 20, entry_count: 10 };
        assert!((stats.hit_rate() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cache_stats_hit_rate_zero() {
        let stats = CacheStats::default();
        assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mock_cache_hit_and_miss() {
        let cache = MockCache::new();
        let id = Uuid::new_v4();

        assert!(cache.get(id).is_none());
        cache.set(id, empty_index());
        assert!(cache.get(id).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn mock_cache_invalidate() {
        let cache = MockCache::new();
        let id = Uuid::new_v4();
        cache.set(id, empty_index());
        cache.invalidate(id);
        assert!(cache.get(id).is_none());
    }
}
