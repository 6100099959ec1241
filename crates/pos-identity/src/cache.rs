//! # TTL Cache
//!
//! A map of timestamped entries with a hybrid eviction policy:
//!
//! 1. every entry at least `ttl` old is dropped;
//! 2. if the map is still over `max_size`, the oldest entries (by write
//!    time) are dropped, at least `ceil(evict_ratio × size)` of them and
//!    always enough to get back under the cap.
//!
//! Eviction is by write time, not last access. The policy lives in the
//! free function [`prune`] so it can be tested without a clock.
//!
//! [`TtlCache`] itself holds no lock and no clock: callers pass `now` and
//! wrap it in a `tokio::sync::RwLock`.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A cached value and the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// Cached value
    pub value: V,
    /// Write time, milliseconds since the epoch
    pub timestamp: i64,
}

/// What a prune pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Entries dropped for age
    pub expired: usize,
    /// Live entries dropped for size
    pub evicted: usize,
}

impl PruneOutcome {
    /// Total entries removed.
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

/// Drop expired entries, then the oldest ones while over `max_size`.
///
/// An entry expires when `now - timestamp >= ttl_ms`.
///
/// ```
/// use pos_identity::cache::{prune, CacheEntry};
/// use std::collections::HashMap;
///
/// let mut entries: HashMap<u32, CacheEntry<()>> = (0..10)
///     .map(|i| (i, CacheEntry { value: (), timestamp: i as i64 }))
///     .collect();
///
/// let outcome = prune(&mut entries, 10, 1_000, 8, 0.2);
/// assert_eq!(outcome.evicted, 2);
/// assert!(!entries.contains_key(&0) && !entries.contains_key(&1));
/// ```
pub fn prune<K, V>(
    entries: &mut HashMap<K, CacheEntry<V>>,
    now: i64,
    ttl_ms: i64,
    max_size: usize,
    evict_ratio: f64,
) -> PruneOutcome
where
    K: Eq + Hash + Clone,
{
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_sub(entry.timestamp) < ttl_ms);
    let expired = before - entries.len();

    let size = entries.len();
    if size <= max_size {
        return PruneOutcome {
            expired,
            evicted: 0,
        };
    }

    let by_ratio = (evict_ratio * size as f64).ceil() as usize;
    let count = by_ratio.max(size - max_size).min(size);

    let mut by_age: Vec<(i64, K)> = entries
        .iter()
        .map(|(key, entry)| (entry.timestamp, key.clone()))
        .collect();
    by_age.sort_by_key(|(timestamp, _)| *timestamp);
    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
    }

    PruneOutcome {
        expired,
        evicted: count,
    }
}

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently held
    pub entries: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries dropped for age
    pub expired: u64,
    /// Entries dropped for size
    pub evicted: u64,
}

/// Timestamped map with TTL and size-based pruning.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl_ms: i64,
    max_size: usize,
    evict_ratio: f64,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: u64,
    evicted: u64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new(ttl: Duration, max_size: usize, evict_ratio: f64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            max_size,
            evict_ratio,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: 0,
            evicted: 0,
        }
    }

    /// The live value for `key`, if any.
    ///
    /// Takes `&self` so lookups can share a read lock; expired entries are
    /// left for the next prune.
    pub fn get(&self, key: &K, now: i64) -> Option<V> {
        let live = self
            .entries
            .get(key)
            .filter(|entry| now.saturating_sub(entry.timestamp) < self.ttl_ms)
            .map(|entry| entry.value.clone());

        let counter = if live.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        live
    }

    /// Write `value` stamped with `now`, then prune.
    pub fn insert(&mut self, key: K, value: V, now: i64) -> PruneOutcome {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                timestamp: now,
            },
        );
        self.prune(now)
    }

    /// Run a prune pass.
    pub fn prune(&mut self, now: i64) -> PruneOutcome {
        let outcome = prune(
            &mut self.entries,
            now,
            self.ttl_ms,
            self.max_size,
            self.evict_ratio,
        );
        self.expired += outcome.expired as u64;
        self.evicted += outcome.evicted as u64;
        if outcome.removed() > 0 {
            tracing::debug!(
                expired = outcome.expired,
                evicted = outcome.evicted,
                remaining = self.entries.len(),
                "Pruned cache"
            );
        }
        outcome
    }

    /// Drop one entry. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, live or not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activity counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired,
            evicted: self.evicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(timestamps: &[i64]) -> HashMap<usize, CacheEntry<&'static str>> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| (i, CacheEntry { value: "v", timestamp: *ts }))
            .collect()
    }

    #[test]
    fn test_prune_drops_expired_only() {
        let mut map = entries(&[0, 50, 99, 100]);
        // ttl 100 at now=150: ages 150, 100, 51, 50
        let outcome = prune(&mut map, 150, 100, 10, 0.2);
        assert_eq!(outcome, PruneOutcome { expired: 2, evicted: 0 });
        assert!(map.contains_key(&2));
        assert!(map.contains_key(&3));
    }

    #[test]
    fn test_prune_age_equal_to_ttl_expires() {
        let mut map = entries(&[0]);
        prune(&mut map, 100, 100, 10, 0.2);
        assert!(map.is_empty());

        let mut map = entries(&[1]);
        prune(&mut map, 100, 100, 10, 0.2);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_prune_evicts_oldest_fifth() {
        // 12 live entries, cap 10: ceil(0.2 * 12) = 3 oldest go.
        let timestamps: Vec<i64> = (0..12).map(|i| 1_000 - i * 10).collect();
        let mut map = entries(&timestamps);
        let outcome = prune(&mut map, 1_000, 60_000, 10, 0.2);
        assert_eq!(outcome.evicted, 3);
        assert_eq!(map.len(), 9);
        for oldest in [9, 10, 11] {
            assert!(!map.contains_key(&oldest));
        }
    }

    #[test]
    fn test_prune_always_gets_under_cap() {
        // 100 live entries, cap 10: the ratio alone would leave 80.
        let timestamps: Vec<i64> = (0..100).collect();
        let mut map = entries(&timestamps);
        let outcome = prune(&mut map, 100, 60_000, 10, 0.2);
        assert_eq!(outcome.evicted, 90);
        assert_eq!(map.len(), 10);
        assert!((90..100).all(|i| map.contains_key(&i)));
    }

    #[test]
    fn test_prune_expiry_runs_before_size_check() {
        let mut map = entries(&[0, 0, 0, 900, 950]);
        let outcome = prune(&mut map, 1_000, 500, 3, 0.2);
        assert_eq!(outcome, PruneOutcome { expired: 3, evicted: 0 });
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(100), 10, 0.2);
        assert_eq!(cache.get(&"a".to_string(), 0), None);

        cache.insert("a".to_string(), 1, 0);
        assert_eq!(cache.get(&"a".to_string(), 99), Some(1));
        assert_eq!(cache.get(&"a".to_string(), 100), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_cache_insert_prunes() {
        let mut cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_millis(100), 4, 0.2);
        for i in 0..4 {
            cache.insert(i, i, i as i64);
        }
        assert_eq!(cache.len(), 4);

        // Fifth write overflows: ceil(0.2 * 5) = 1 evicted.
        let outcome = cache.insert(4, 4, 4);
        assert_eq!(outcome.evicted, 1);
        assert_eq!(cache.get(&0, 4), None);
        assert_eq!(cache.get(&1, 4), Some(1));

        // Everything older than 100 ms goes on the next write.
        let outcome = cache.insert(9, 9, 104);
        assert_eq!(outcome.expired, 4);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired, 4);
        assert_eq!(cache.stats().evicted, 1);
    }

    #[test]
    fn test_cache_remove_and_clear() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(1), 10, 0.2);
        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        assert!(cache.remove(&"a"));
        assert!(!cache.remove(&"a"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
