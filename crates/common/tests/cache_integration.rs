//! Integration tests for the TTL cache
//!
//! Covers expiry against a mock clock, capacity handling and concurrent access

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use catalog_common::cache::{CacheConfig, TtlCache};
use catalog_common::time::MockClock;

/// Verifies that an entry is visible for exactly its TTL.
///
/// # Test Steps
/// 1. Put a value with a 60 second TTL
/// 2. Advance the clock in steps and read after each one
/// 3. Verify the value is returned until the TTL elapses, then never again
#[test]
fn test_entry_visible_until_ttl_elapses() {
    let clock = MockClock::new();
    let cache = TtlCache::with_clock(CacheConfig::default(), clock.clone());

    cache.put(("categories", "abc"), "Filmes".to_string(), Duration::from_secs(60));

    for _ in 0..5 {
        assert_eq!(cache.get(&("categories", "abc")), Some("Filmes".to_string()));
        clock.advance(Duration::from_secs(11));
    }

    clock.set_elapsed(Duration::from_secs(60));
    assert_eq!(cache.get(&("categories", "abc")), None);
}

/// Verifies that composite keys keep dependency namespaces apart.
#[test]
fn test_composite_keys_do_not_collide() {
    let cache: TtlCache<(String, String), i32> = TtlCache::new(CacheConfig::default());

    cache.put(("categories".into(), "1".into()), 1, Duration::from_secs(60));
    cache.put(("genres".into(), "1".into()), 2, Duration::from_secs(60));

    assert_eq!(cache.get(&("categories".into(), "1".into())), Some(1));
    assert_eq!(cache.get(&("genres".into(), "1".into())), Some(2));

    cache.invalidate(&("categories".into(), "1".into()));
    assert_eq!(cache.get(&("genres".into(), "1".into())), Some(2));
}

/// Verifies capacity handling purges expired entries before evicting live
/// ones.
///
/// # Test Steps
/// 1. Fill a cache of capacity 3, one entry with a short TTL
/// 2. Let the short entry expire
/// 3. Put a fourth entry
/// 4. Verify no live entry was evicted
#[test]
fn test_capacity_purges_expired_first() {
    let clock = MockClock::new();
    let cache = TtlCache::with_clock(CacheConfig::bounded(3), clock.clone());

    cache.put("a", 1, Duration::from_secs(1));
    cache.put("b", 2, Duration::from_secs(100));
    cache.put("c", 3, Duration::from_secs(100));
    clock.advance(Duration::from_secs(2));

    cache.put("d", 4, Duration::from_secs(100));

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&"b"), Some(2));
    assert_eq!(cache.get(&"c"), Some(3));
    assert_eq!(cache.get(&"d"), Some(4));

    let stats = cache.stats();
    assert_eq!(stats.evictions, 0);
    assert_eq!(stats.expirations, 1);
}

/// Verifies the cache is safe to share across threads.
///
/// # Test Steps
/// 1. Spawn 8 threads that each write and read 100 distinct keys
/// 2. Join all threads
/// 3. Verify every key is present with its own value
#[test]
fn test_concurrent_access() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new(CacheConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("{t}-{i}");
                    cache.put(key.clone(), t * 1000 + i, Duration::from_secs(60));
                    assert_eq!(cache.get(&key), Some(t * 1000 + i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 800);
    assert_eq!(cache.get(&"7-99".to_string()), Some(7099));
}
