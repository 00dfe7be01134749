//! In-memory cache for parsed ABI indexes, using moka.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  MemoryAbiCache                       │
//! │                                                       │
//! │   ┌─────────────────────────────────────────────┐    │
//! │   │   moka::sync::Cache<Uuid, Arc<AbiIndex>>      │    │
//! │   │   TTL: cache.abi_ttl_ms                       │    │
//! │   │   Capacity: cache.abi_max_capacity            │    │
//! │   └─────────────────────────────────────────────┘    │
//! │                                                       │
//! │   hits/misses tracked via atomics for `stats()`       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use evm_indexer::config::CacheSettings;
//! use evm_indexer::store::MemoryAbiCache;
//!
//! let cache = MemoryAbiCache::new(&settings.cache);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache as MokaCache;
use uuid::Uuid;

use crate::abi::AbiIndex;
use crate::config::CacheSettings;
use crate::ports::{Cache, CacheStats};

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY ABI CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// TTL- and capacity-bounded cache of parsed [`AbiIndex`]es, keyed by ABI id.
///
/// # Thread Safety
///
/// All operations are thread-safe; share via `Arc<MemoryAbiCache>`.
#[derive(Debug)]
pub struct MemoryAbiCache {
    entries: MokaCache<Uuid, Arc<AbiIndex>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryAbiCache {
    /// Build a cache sized per `cache.abi_ttl_ms` / `cache.abi_max_capacity`.
    #[must_use]
    pub fn new(settings: &CacheSettings) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(settings.abi_ttl())
            .max_capacity(settings.abi_max_capacity)
            .build();

        Self { entries, hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }
}

impl Cache for MemoryAbiCache {
    fn get(&self, abi_id: Uuid) -> Option<Arc<AbiIndex>> {
        match self.entries.get(&abi_id) {
            Some(index) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(index)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, abi_id: Uuid, index: Arc<AbiIndex>) {
        self.entries.insert(abi_id, index);
    }

    fn invalidate(&self, abi_id: Uuid) {
        self.entries.invalidate(&abi_id);
    }

    fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.entry_count() as usize,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use alloy::json_abi::JsonAbi;

    use super::*;

    fn settings() -> CacheSettings {
        CacheSettings { abi_ttl_ms: 60_000, abi_max_capacity: 100 }
    }

    fn empty_index() -> Arc<AbiIndex> {
        let abi: JsonAbi = serde_json::from_value(serde_json::json!([])).expect("valid empty ABI");
        Arc::new(AbiIndex::build(&abi, "Empty"))
    }

    #[test]
    fn hit_and_miss_are_tracked() {
        let cache = MemoryAbiCache::new(&settings());
        let id = Uuid::new_v4();

        assert!(cache.get(id).is_none());
        cache.set(id, empty_index());
        assert!(cache.get(id).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = MemoryAbiCache::new(&settings());
        let id = Uuid::new_v4();
        cache.set(id, empty_index());
        cache.invalidate(id);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let cache = MemoryAbiCache::new(&settings());
        cache.set(Uuid::new_v4(), empty_index());
        cache.set(Uuid::new_v4(), empty_index());
        cache.invalidate_all();
        assert_eq!(cache.stats().entry_count, 0);
    }
}
