//! Modular common utilities shared across catalog crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: clock abstraction and error types
//! - `runtime`: in-memory infrastructure (cache, resilience)
//! - `observability`: tracing for the runtime modules

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{CacheConfig, CacheStats, TtlCache};
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, Bulkhead, BulkheadConfig, BulkheadMetrics, BulkheadPermit, CallPermit,
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState, ConfigError, Jitter,
    RetryConfig, RetryExecutor, RetryOutcome, RetryPolicy,
};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
