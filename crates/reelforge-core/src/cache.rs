//! The CAG prefix-state cache (§4.4, §5, §9).
//!
//! Keyed on `(persona_id, generator_model_id, chunk_recipe_id, normalized_context_fingerprint)`
//! (§9 design note: all four components matter, not context alone, since a persona change or
//! a chunk-recipe bump invalidates reuse even for identical retrieved context). Bounded by a
//! configured MiB ceiling and LRU-evicted. Per §9, the cache is constructed and injected into
//! the CAG pipeline explicitly rather than reached for as a global singleton, so tests can run
//! with an isolated instance.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::{CagCacheEntry, CagCacheKey};

/// Point-in-time counters surfaced by the `cache metrics` CLI operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics {
    pub entries: usize,
    pub size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner {
    entries: HashMap<CagCacheKey, CagCacheEntry>,
    /// Most-recently-used key last; eviction pops from the front.
    order: Vec<CagCacheKey>,
    size_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Linearizable per §5: all mutating operations take the same internal lock, so concurrent
/// `get`/`put` calls from parallel CAG requests observe a single consistent order.
pub struct CagCache {
    ceiling_bytes: u64,
    inner: Mutex<Inner>,
}

impl CagCache {
    pub fn new(ceiling_mib: u64) -> Self {
        Self {
            ceiling_bytes: ceiling_mib.saturating_mul(1024 * 1024),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: Vec::new(),
                size_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn get(&self, key: &CagCacheKey) -> Option<CagCacheEntry> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if let Some(entry) = inner.entries.get(key).cloned() {
            inner.hits += 1;
            touch(&mut inner.order, key);
            Some(entry)
        } else {
            inner.misses += 1;
            None
        }
    }

    pub fn put(&self, mut entry: CagCacheEntry) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if let Some(existing) = inner.entries.remove(&entry.key) {
            inner.size_bytes = inner.size_bytes.saturating_sub(existing.size_bytes);
            inner.order.retain(|k| k != &entry.key);
        }

        while inner.size_bytes.saturating_add(entry.size_bytes) > self.ceiling_bytes
            && !inner.order.is_empty()
        {
            let evicted_key = inner.order.remove(0);
            if let Some(evicted) = inner.entries.remove(&evicted_key) {
                inner.size_bytes = inner.size_bytes.saturating_sub(evicted.size_bytes);
                inner.evictions += 1;
                tracing::debug!(persona_id = ?evicted.key.persona_id, "evicted CAG cache entry");
            }
        }

        if entry.size_bytes <= self.ceiling_bytes {
            inner.size_bytes += entry.size_bytes;
            inner.order.push(entry.key.clone());
            entry.last_used = chrono::Utc::now();
            inner.entries.insert(entry.key.clone(), entry);
        }
    }

    pub fn evict(&self, key: &CagCacheKey) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if let Some(removed) = inner.entries.remove(key) {
            inner.size_bytes = inner.size_bytes.saturating_sub(removed.size_bytes);
            inner.order.retain(|k| k != key);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.order.clear();
        inner.size_bytes = 0;
    }

    pub fn metrics(&self) -> CacheMetrics {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        CacheMetrics {
            entries: inner.entries.len(),
            size_bytes: inner.size_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

fn touch(order: &mut Vec<CagCacheKey>, key: &CagCacheKey) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        let k = order.remove(pos);
        order.push(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fingerprint: &str) -> CagCacheKey {
        CagCacheKey {
            persona_id: None,
            generator_model_id: "model-a".into(),
            chunk_recipe_id: "v1".into(),
            normalized_context_fingerprint: fingerprint.into(),
        }
    }

    fn entry(fingerprint: &str, size_bytes: u64) -> CagCacheEntry {
        CagCacheEntry {
            key: key(fingerprint),
            prefix_state: vec![0u8; size_bytes as usize],
            size_bytes,
            last_used: chrono::Utc::now(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = CagCache::new(1);
        cache.put(entry("a", 10));
        assert!(cache.get(&key("a")).is_some());
        assert_eq!(cache.metrics().hits, 1);
    }

    #[test]
    fn miss_increments_counter() {
        let cache = CagCache::new(1);
        assert!(cache.get(&key("missing")).is_none());
        assert_eq!(cache.metrics().misses, 1);
    }

    #[test]
    fn eviction_respects_mib_ceiling() {
        let cache = CagCache::new(0); // ceiling of 0 MiB rounds to 0 bytes
        cache.put(entry("a", 1));
        // entry is larger than the (zero) ceiling so it is never actually stored
        assert_eq!(cache.metrics().entries, 0);
    }

    #[test]
    fn lru_evicts_oldest_first() {
        let cache = CagCache::new(1);
        let one_mib = 1024 * 1024;
        cache.put(entry("a", one_mib / 2));
        cache.put(entry("b", one_mib / 2));
        // touch "a" so "b" becomes the least-recently-used entry
        cache.get(&key("a"));
        cache.put(entry("c", one_mib / 2));
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn clear_resets_size_and_entries() {
        let cache = CagCache::new(1);
        cache.put(entry("a", 10));
        cache.clear();
        let metrics = cache.metrics();
        assert_eq!(metrics.entries, 0);
        assert_eq!(metrics.size_bytes, 0);
    }

    #[test]
    fn evict_removes_single_key() {
        let cache = CagCache::new(1);
        cache.put(entry("a", 10));
        cache.evict(&key("a"));
        assert!(cache.get(&key("a")).is_none());
    }
}
