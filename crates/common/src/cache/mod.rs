//! Read-through cache primitives with per-entry time-to-live
//!
//! [`TtlCache`] is a thread-safe key/value store where every entry carries its
//! own expiry instant, supplied on `put`. Expired entries are never returned;
//! they are removed lazily on access, or eagerly by
//! [`TtlCache::purge_expired`].
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use catalog_common::cache::{CacheConfig, TtlCache};
//!
//! let cache: TtlCache<String, i32> = TtlCache::new(CacheConfig::default());
//! cache.put("key".to_string(), 42, Duration::from_secs(60));
//! assert_eq!(cache.get(&"key".to_string()), Some(42));
//!
//! cache.invalidate(&"key".to_string());
//! assert_eq!(cache.get(&"key".to_string()), None);
//! ```
//!
//! # Capacity
//!
//! With `max_entries` set, a `put` of a new key into a full cache first
//! purges expired entries and then evicts the entry closest to expiry.

mod config;
mod core;
mod stats;

// Re-export public API
pub use self::core::TtlCache;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use stats::CacheStats;
