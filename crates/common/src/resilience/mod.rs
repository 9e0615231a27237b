//! Resilience patterns for calls that cross a network boundary
//!
//! - **Circuit Breaker**: stops calling a dependency whose recent failure
//!   ratio is too high, then probes for recovery after a cooldown
//! - **Bulkhead**: caps concurrent in-flight calls and refuses excess calls
//!   without queueing
//! - **Retry**: re-issues retry-eligible failures with fixed or exponential
//!   backoff and jitter
//!
//! The patterns are generic over the error type and know nothing about HTTP;
//! composing them around a concrete transport is the caller's job.

pub mod bulkhead;
pub mod circuit_breaker;
pub mod retry;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadMetrics, BulkheadPermit};
pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, ConfigError, ConfigResult,
};
pub use retry::{
    policies, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryExecutor,
    RetryOutcome, RetryPolicy,
};
