//! Bulkhead pattern for limiting concurrent operations
//!
//! A bulkhead caps how many calls to one dependency may be in flight at once.
//! Admission never waits: when every permit is taken the caller is refused
//! immediately, so saturation of one dependency cannot queue up work that
//! starves the rest of the process.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::circuit_breaker::{ConfigError, ConfigResult};

/// Configuration for bulkhead behavior
#[derive(Debug, Clone)]
pub struct BulkheadConfig {
    /// Maximum number of concurrent operations allowed
    pub max_concurrent: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self { max_concurrent: 25 }
    }
}

impl BulkheadConfig {
    pub fn new(max_concurrent: usize) -> ConfigResult<Self> {
        let config = Self { max_concurrent };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::invalid("max_concurrent must be greater than 0"));
        }
        if self.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(ConfigError::invalid(format!(
                "max_concurrent cannot exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// Metrics for bulkhead monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkheadMetrics {
    /// Permits currently held
    pub in_use: usize,
    /// Maximum concurrent operations allowed
    pub max_concurrent: usize,
    /// Total number of admitted calls
    pub admitted: u64,
    /// Total number of calls refused at capacity
    pub rejected: u64,
}

impl BulkheadMetrics {
    /// Current utilization (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.in_use as f64 / self.max_concurrent as f64
    }

    pub fn is_at_capacity(&self) -> bool {
        self.in_use >= self.max_concurrent
    }
}

/// Non-blocking concurrency cap for one dependency
///
/// # Examples
///
/// ```rust
/// use catalog_common::resilience::{Bulkhead, BulkheadConfig};
///
/// let bulkhead = Bulkhead::new(BulkheadConfig::new(1).unwrap());
///
/// let permit = bulkhead.try_acquire().expect("capacity available");
/// assert!(bulkhead.try_acquire().is_none());
///
/// permit.release();
/// assert_eq!(bulkhead.in_use(), 0);
/// ```
pub struct Bulkhead {
    config: BulkheadConfig,
    semaphore: Arc<Semaphore>,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

impl Bulkhead {
    /// Create a new bulkhead with a validated configuration
    pub fn new(config: BulkheadConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            config,
        }
    }

    /// Take a permit without waiting
    ///
    /// Returns `None` when every permit is in use. The permit returns to the
    /// pool when dropped or explicitly released.
    pub fn try_acquire(&self) -> Option<BulkheadPermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.admitted.fetch_add(1, Ordering::Relaxed);
                Some(BulkheadPermit { _permit: permit })
            }
            Err(_) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(max_concurrent = self.config.max_concurrent, "Bulkhead at capacity");
                None
            }
        }
    }

    /// Number of permits currently held
    pub fn in_use(&self) -> usize {
        self.config.max_concurrent.saturating_sub(self.semaphore.available_permits())
    }

    pub fn max_concurrent(&self) -> usize {
        self.config.max_concurrent
    }

    /// Get bulkhead metrics
    pub fn metrics(&self) -> BulkheadMetrics {
        BulkheadMetrics {
            in_use: self.in_use(),
            max_concurrent: self.config.max_concurrent,
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// Reset metrics counters
    pub fn reset_metrics(&self) {
        self.admitted.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
    }
}

impl fmt::Debug for Bulkhead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bulkhead")
            .field("max_concurrent", &self.config.max_concurrent)
            .field("in_use", &self.in_use())
            .finish()
    }
}

/// A held bulkhead slot, returned to the pool on drop
#[must_use = "dropping the permit releases it immediately"]
#[derive(Debug)]
pub struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
}

impl BulkheadPermit {
    /// Return the slot to the pool
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn bulkhead(max: usize) -> Bulkhead {
        Bulkhead::new(BulkheadConfig::new(max).unwrap())
    }

    #[test]
    fn test_config_validation() {
        assert!(BulkheadConfig::new(0).is_err());
        assert!(BulkheadConfig::new(1).is_ok());
        assert_eq!(BulkheadConfig::default().max_concurrent, 25);
    }

    #[test]
    fn test_rejects_when_saturated() {
        let bulkhead = bulkhead(2);

        let first = bulkhead.try_acquire();
        let second = bulkhead.try_acquire();
        let third = bulkhead.try_acquire();

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(third.is_none());
        assert_eq!(bulkhead.in_use(), 2);

        let metrics = bulkhead.metrics();
        assert_eq!(metrics.admitted, 2);
        assert_eq!(metrics.rejected, 1);
        assert!(metrics.is_at_capacity());
    }

    #[test]
    fn test_release_and_drop_return_permits() {
        let bulkhead = bulkhead(2);

        let first = bulkhead.try_acquire().unwrap();
        {
            let _second = bulkhead.try_acquire().unwrap();
            assert_eq!(bulkhead.in_use(), 2);
        }
        assert_eq!(bulkhead.in_use(), 1);

        first.release();
        assert_eq!(bulkhead.in_use(), 0);
        assert!(bulkhead.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_in_use_never_exceeds_max_under_contention() {
        let bulkhead = Arc::new(bulkhead(3));
        let peak = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let bulkhead = Arc::clone(&bulkhead);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                if let Some(permit) = bulkhead.try_acquire() {
                    peak.fetch_max(bulkhead.in_use() as u64, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    permit.release();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(bulkhead.in_use(), 0);
        let metrics = bulkhead.metrics();
        assert_eq!(metrics.admitted + metrics.rejected, 20);
    }

    #[test]
    fn test_metrics_utilization() {
        let metrics = BulkheadMetrics { in_use: 5, max_concurrent: 10, admitted: 8, rejected: 2 };
        assert_eq!(metrics.utilization(), 0.5);
        assert!(!metrics.is_at_capacity());
    }
}
