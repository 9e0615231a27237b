//! Per-dependency resilience state
//!
//! One [`DependencyState`] exists per named dependency for the lifetime of the
//! process. It is built once from configuration and shared by handle with
//! every call site, so all callers for a name see the same breaker, bulkhead
//! and cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use catalog_common::cache::{CacheConfig, TtlCache};
use catalog_common::resilience::policies::PredicateRetry;
use catalog_common::resilience::{
    BackoffStrategy, Bulkhead, BulkheadConfig, CircuitBreaker, CircuitBreakerConfig, ConfigError,
    Jitter, RetryConfig, RetryExecutor,
};
use catalog_common::time::{Clock, SystemClock};
use catalog_domain::config::{
    BackoffSettings, CircuitBreakerSettings, DependencyConfig, JitterSettings, RetrySettings,
};
use catalog_domain::{CatalogError, LookupError, ResourceSnapshot, Result};
use tracing::info;

/// Retry executor that only retries retry-eligible lookup failures
pub type LookupRetry = RetryExecutor<PredicateRetry<fn(&LookupError) -> bool>>;

/// Shared, mutable resilience state for one dependency
pub struct DependencyState<C: Clock = SystemClock> {
    name: String,
    breaker: CircuitBreaker<C>,
    bulkhead: Bulkhead,
    retry: LookupRetry,
    cache: TtlCache<String, ResourceSnapshot, C>,
    cache_ttl: Duration,
}

impl<C: Clock + Clone> DependencyState<C> {
    fn from_config(name: &str, config: &DependencyConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let invalid = |e: ConfigError| CatalogError::Config(format!("dependency '{name}': {e}"));

        let breaker_config = breaker_config(&config.circuit_breaker).map_err(invalid)?;
        let breaker = CircuitBreaker::with_clock(breaker_config, clock.clone()).map_err(invalid)?;
        let bulkhead =
            Bulkhead::new(BulkheadConfig::new(config.bulkhead.max_concurrent).map_err(invalid)?);
        let retry = RetryExecutor::new(
            retry_config(&config.retry).map_err(invalid)?,
            PredicateRetry::new(LookupError::is_retryable as fn(&LookupError) -> bool),
        );
        let cache = TtlCache::with_clock(
            CacheConfig::builder()
                .max_entries(config.cache.max_entries)
                .track_metrics(true)
                .build(),
            clock,
        );

        Ok(Self {
            name: name.to_string(),
            breaker,
            bulkhead,
            retry,
            cache,
            cache_ttl: config.cache.ttl(),
        })
    }
}

impl<C: Clock> DependencyState<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    pub fn bulkhead(&self) -> &Bulkhead {
        &self.bulkhead
    }

    pub fn retry(&self) -> &LookupRetry {
        &self.retry
    }

    /// Snapshots cached for this dependency, keyed by resource id
    pub fn cache(&self) -> &TtlCache<String, ResourceSnapshot, C> {
        &self.cache
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
}

impl<C: Clock> fmt::Debug for DependencyState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyState")
            .field("name", &self.name)
            .field("breaker", &self.breaker)
            .field("bulkhead", &self.bulkhead)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Explicit registry of dependency states keyed by name
#[derive(Debug)]
pub struct DependencyRegistry<C: Clock = SystemClock> {
    states: HashMap<String, Arc<DependencyState<C>>>,
}

impl DependencyRegistry<SystemClock> {
    pub fn builder() -> DependencyRegistryBuilder<SystemClock> {
        DependencyRegistryBuilder::with_clock(SystemClock)
    }
}

impl<C: Clock> DependencyRegistry<C> {
    pub fn get(&self, name: &str) -> Option<Arc<DependencyState<C>>> {
        self.states.get(name).cloned()
    }

    /// Registered dependency names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Administratively open the breaker for a dependency
    pub fn force_open(&self, name: &str) -> std::result::Result<(), LookupError> {
        self.require(name)?.breaker().transition_to_open();
        Ok(())
    }

    /// Administratively close the breaker for a dependency
    pub fn force_closed(&self, name: &str) -> std::result::Result<(), LookupError> {
        self.require(name)?.breaker().transition_to_closed();
        Ok(())
    }

    /// Reset the breaker and drop every cached snapshot for a dependency
    pub fn reset(&self, name: &str) -> std::result::Result<(), LookupError> {
        let state = self.require(name)?;
        state.breaker().reset();
        state.cache().clear();
        Ok(())
    }

    fn require(&self, name: &str) -> std::result::Result<&Arc<DependencyState<C>>, LookupError> {
        self.states
            .get(name)
            .ok_or_else(|| LookupError::UnknownDependency { dependency: name.to_string() })
    }
}

/// Builder for [`DependencyRegistry`]
pub struct DependencyRegistryBuilder<C: Clock = SystemClock> {
    clock: C,
    states: HashMap<String, Arc<DependencyState<C>>>,
}

impl<C: Clock + Clone> DependencyRegistryBuilder<C> {
    /// Builder whose breakers and caches read time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self { clock, states: HashMap::new() }
    }

    /// Register a dependency, validating its configuration
    ///
    /// # Errors
    /// Returns `CatalogError::Config` for an empty or duplicate name or an
    /// invalid configuration.
    pub fn register(mut self, name: &str, config: &DependencyConfig) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Config("dependency name cannot be empty".to_string()));
        }
        if self.states.contains_key(name) {
            return Err(CatalogError::Config(format!("dependency '{name}' registered twice")));
        }

        let state = DependencyState::from_config(name, config, self.clock.clone())?;
        info!(
            dependency = name,
            max_concurrent = config.bulkhead.max_concurrent,
            max_attempts = config.retry.max_attempts,
            cache_ttl_secs = config.cache.ttl_secs,
            "Registered dependency"
        );
        self.states.insert(name.to_string(), Arc::new(state));
        Ok(self)
    }

    pub fn build(self) -> DependencyRegistry<C> {
        DependencyRegistry { states: self.states }
    }
}

fn breaker_config(
    settings: &CircuitBreakerSettings,
) -> std::result::Result<CircuitBreakerConfig, ConfigError> {
    CircuitBreakerConfig::builder()
        .failure_rate_threshold(settings.failure_rate_threshold)
        .sliding_window_size(settings.sliding_window_size)
        .minimum_calls(settings.minimum_calls)
        .open_timeout(settings.open_timeout())
        .half_open_trial_calls(settings.half_open_trial_calls)
        .build()
}

fn retry_config(settings: &RetrySettings) -> std::result::Result<RetryConfig, ConfigError> {
    let builder = RetryConfig::builder().max_attempts(settings.max_attempts).jitter(
        match settings.jitter {
            JitterSettings::None => Jitter::None,
            JitterSettings::Full => Jitter::Full,
            JitterSettings::Equal => Jitter::Equal,
        },
    );
    let builder = match settings.backoff {
        BackoffSettings::Fixed { delay_ms } => builder.fixed_backoff(Duration::from_millis(delay_ms)),
        BackoffSettings::Exponential { initial_ms, multiplier, max_ms } => builder
            .exponential_backoff(
                Duration::from_millis(initial_ms),
                multiplier,
                Duration::from_millis(max_ms),
            ),
    };
    builder.build()
}

#[cfg(test)]
mod tests {
    use catalog_common::resilience::CircuitState;
    use catalog_common::time::MockClock;

    use super::*;

    fn config() -> DependencyConfig {
        DependencyConfig::new("http://localhost/api/categories")
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = DependencyRegistry::builder()
            .register("categories", &config())
            .unwrap()
            .register("genres", &config())
            .unwrap()
            .build();

        assert_eq!(registry.names(), vec!["categories", "genres"]);
        let state = registry.get("categories").unwrap();
        assert_eq!(state.name(), "categories");
        assert_eq!(state.bulkhead().max_concurrent(), 25);
        assert_eq!(state.retry().config().max_attempts, 2);
        assert_eq!(state.cache_ttl(), Duration::from_secs(600));
        assert!(registry.get("cast_members").is_none());
    }

    #[test]
    fn test_same_handle_for_every_caller() {
        let registry = DependencyRegistry::builder().register("categories", &config()).unwrap().build();

        let a = registry.get("categories").unwrap();
        let b = registry.get("categories").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_rejects_duplicate_and_invalid() {
        let duplicate = DependencyRegistry::builder()
            .register("categories", &config())
            .unwrap()
            .register("categories", &config());
        assert!(matches!(duplicate, Err(CatalogError::Config(_))));

        let mut bad = config();
        bad.circuit_breaker.minimum_calls = 100;
        assert!(DependencyRegistry::builder().register("categories", &bad).is_err());

        assert!(DependencyRegistry::builder().register(" ", &config()).is_err());
    }

    #[test]
    fn test_administrative_helpers() {
        let clock = MockClock::new();
        let registry = DependencyRegistryBuilder::with_clock(clock)
            .register("categories", &config())
            .unwrap()
            .build();
        let state = registry.get("categories").unwrap();

        registry.force_open("categories").unwrap();
        assert_eq!(state.breaker().state(), CircuitState::Open);

        registry.force_closed("categories").unwrap();
        assert_eq!(state.breaker().state(), CircuitState::Closed);

        state.cache().put("1".into(), snapshot("1"), Duration::from_secs(60));
        registry.reset("categories").unwrap();
        assert!(state.cache().is_empty());

        assert_eq!(
            registry.force_open("genres"),
            Err(LookupError::UnknownDependency { dependency: "genres".into() })
        );
    }

    #[test]
    fn test_fixed_backoff_settings_map_through() {
        let settings = RetrySettings {
            max_attempts: 3,
            backoff: BackoffSettings::Fixed { delay_ms: 40 },
            jitter: JitterSettings::None,
        };
        let retry = retry_config(&settings).unwrap();

        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.backoff, BackoffStrategy::Fixed(Duration::from_millis(40)));
        assert_eq!(retry.jitter, Jitter::None);
    }

    fn snapshot(id: &str) -> ResourceSnapshot {
        let now = chrono::Utc::now();
        ResourceSnapshot {
            id: id.to_string(),
            name: "Aulas".into(),
            description: None,
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
