//! Core cache implementation with per-entry expiry
//!
//! Entries are stamped with an absolute expiry instant when they are written.
//! Reads compare that instant with the injected [`Clock`], so expiry is fully
//! deterministic under a [`crate::time::MockClock`].

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::config::CacheConfig;
use super::stats::{CacheStats, MetricsCollector};
use crate::time::{Clock, SystemClock};

/// Longest expiry an entry can be given; larger TTLs are clamped to it
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe key/value cache where each entry carries its own TTL
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for expiry checks (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use catalog_common::cache::{CacheConfig, TtlCache};
/// use catalog_common::time::MockClock;
///
/// let clock = MockClock::new();
/// let cache = TtlCache::with_clock(CacheConfig::default(), clock.clone());
///
/// cache.put("a", 1, Duration::from_secs(10));
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(cache.get(&"a"), None);
/// ```
pub struct TtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache with the given configuration using system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a new cache with a custom clock (useful for testing)
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            metrics: MetricsCollector::default(),
            clock,
        }
    }

    /// Get a live value
    ///
    /// Returns `None` if the key is absent or its entry has expired. An
    /// expired entry is removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    self.record(MetricsCollector::record_miss);
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    self.record(MetricsCollector::record_hit);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent put may have refreshed it.
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.record(MetricsCollector::record_hit);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                if self.config.track_metrics {
                    self.metrics.record_miss();
                    self.metrics.record_expirations(1);
                }
                None
            }
            None => {
                self.record(MetricsCollector::record_miss);
                None
            }
        }
    }

    /// Store a value that stays visible for `ttl`
    ///
    /// Overwrites any existing entry for the key and restarts its expiry.
    /// A zero `ttl` stores an entry that is already expired. A `ttl` longer
    /// than a century is clamped to one.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now);
        let mut entries = self.entries.write();

        if let Some(max) = self.config.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                self.make_room(&mut entries, now);
            }
        }

        entries.insert(key, CacheEntry { value, expires_at });
        self.record(MetricsCollector::record_put);
    }

    /// Get a live value or compute, store and return a fresh one
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Duration, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = f();
        self.put(key, value.clone(), ttl);
        value
    }

    /// Remove an entry. Returns the previous value if it was still live.
    pub fn invalidate(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries.write().remove(key).filter(|entry| !entry.is_expired(now)).map(|e| e.value)
    }

    /// Whether a live entry exists for the key. Does not touch metrics.
    pub fn contains_key(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.entries.read().get(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let removed = Self::drop_expired(&mut entries, now);
        if self.config.track_metrics && removed > 0 {
            self.metrics.record_expirations(removed as u64);
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len(), self.config.max_entries)
    }

    /// Reset all counters to zero
    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    fn make_room(&self, entries: &mut HashMap<K, CacheEntry<V>>, now: Instant) {
        let expired = Self::drop_expired(entries, now);
        if self.config.track_metrics && expired > 0 {
            self.metrics.record_expirations(expired as u64);
        }

        let Some(max) = self.config.max_entries else { return };
        while entries.len() >= max {
            let victim = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    entries.remove(&key);
                    self.record(MetricsCollector::record_eviction);
                }
                None => break,
            }
        }
    }

    fn drop_expired(entries: &mut HashMap<K, CacheEntry<V>>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    fn record(&self, f: fn(&MetricsCollector)) {
        if self.config.track_metrics {
            f(&self.metrics);
        }
    }
}

impl<K, V, C> std::fmt::Debug for TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.len())
            .field("max_entries", &self.config.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockClock;

    fn cache_with_clock() -> (TtlCache<String, i32, MockClock>, MockClock) {
        let clock = MockClock::new();
        let cache = TtlCache::with_clock(
            CacheConfig::builder().track_metrics(true).build(),
            clock.clone(),
        );
        (cache, clock)
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(60));

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn test_entry_expires_at_ttl_boundary() {
        let (cache, clock) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(10));

        clock.advance(Duration::from_millis(9_999));
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        clock.advance_millis(1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty(), "expired entry should be removed on read");
    }

    #[test]
    fn test_each_entry_has_own_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("short".to_string(), 1, Duration::from_secs(1));
        cache.put("long".to_string(), 2, Duration::from_secs(100));

        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.get(&"short".to_string()), None);
        assert_eq!(cache.get(&"long".to_string()), Some(2));
    }

    #[test]
    fn test_overwrite_restarts_expiry() {
        let (cache, clock) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));
        cache.put("a".to_string(), 2, Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn test_zero_ttl_is_never_visible() {
        let (cache, _) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::ZERO);
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn test_huge_ttl_is_clamped_not_expired() {
        let (cache, clock) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::MAX);
        cache.put("b".to_string(), 2, Duration::from_secs(u64::MAX));

        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), Some(2));
    }

    #[test]
    fn test_invalidate() {
        let (cache, _) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(60));

        assert_eq!(cache.invalidate(&"a".to_string()), Some(1));
        assert_eq!(cache.invalidate(&"a".to_string()), None);
        assert!(!cache.contains_key(&"a".to_string()));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(1));
        cache.put("b".to_string(), 2, Duration::from_secs(1));
        cache.put("c".to_string(), 3, Duration::from_secs(60));

        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_capacity_prefers_expired_then_soonest_expiry() {
        let clock = MockClock::new();
        let cache = TtlCache::with_clock(CacheConfig::bounded(2), clock.clone());

        cache.put("soon", 1, Duration::from_secs(5));
        cache.put("late", 2, Duration::from_secs(50));
        cache.put("new", 3, Duration::from_secs(30));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"soon"), None);
        assert_eq!(cache.get(&"late"), Some(2));
        assert_eq!(cache.get(&"new"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_or_insert_with_only_computes_on_miss() {
        let (cache, _) = cache_with_clock();
        let mut calls = 0;

        let first = cache.get_or_insert_with("a".to_string(), Duration::from_secs(60), || {
            calls += 1;
            7
        });
        let second = cache.get_or_insert_with("a".to_string(), Duration::from_secs(60), || 99);

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let (cache, _) = cache_with_clock();
        cache.put("a".to_string(), 1, Duration::from_secs(60));
        cache.get(&"a".to_string());
        cache.get(&"missing".to_string());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.size, 1);
    }
}
