//! Configuration structures
//!
//! Every knob has a serde default, so a configuration file only needs to name
//! what differs from the reference deployment. Durations are stored as plain
//! integers to keep JSON and TOML files readable; accessor methods hand out
//! [`Duration`]s.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, Result};

/// Name of the category registry dependency
pub const CATEGORIES_DEPENDENCY: &str = "categories";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Remote dependencies keyed by name (e.g. `categories`)
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyConfig>,

    #[serde(default)]
    pub search: SearchStoreConfig,
}

impl CatalogConfig {
    /// Validate every dependency and the search store settings
    pub fn validate(&self) -> Result<()> {
        for (name, dependency) in &self.dependencies {
            if name.trim().is_empty() {
                return Err(CatalogError::Config("dependency name cannot be empty".to_string()));
            }
            dependency
                .validate()
                .map_err(|e| CatalogError::Config(format!("dependency '{name}': {e}")))?;
        }
        self.search.validate()
    }
}

/// Per-dependency transport and resilience settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Base URL; resources are fetched from `{base_url}/{id}`
    pub base_url: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub bulkhead: BulkheadSettings,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl DependencyConfig {
    /// Configuration with reference defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            retry: RetrySettings::default(),
            bulkhead: BulkheadSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            cache: CacheSettings::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject values that would make the resilience stack meaningless
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CatalogError::Config("base_url cannot be empty".to_string()));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(CatalogError::Config("timeouts must be greater than 0".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(CatalogError::Config("retry.max_attempts must be greater than 0".to_string()));
        }
        if let BackoffSettings::Exponential { multiplier, .. } = self.retry.backoff {
            if !(multiplier >= 1.0 && multiplier.is_finite()) {
                return Err(CatalogError::Config(format!(
                    "retry.backoff.multiplier must be >= 1, got {multiplier}"
                )));
            }
        }
        if self.bulkhead.max_concurrent == 0 {
            return Err(CatalogError::Config(
                "bulkhead.max_concurrent must be greater than 0".to_string(),
            ));
        }

        let breaker = &self.circuit_breaker;
        if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 1.0) {
            return Err(CatalogError::Config(format!(
                "circuit_breaker.failure_rate_threshold must be in (0, 1], got {}",
                breaker.failure_rate_threshold
            )));
        }
        if breaker.minimum_calls == 0 || breaker.sliding_window_size == 0 {
            return Err(CatalogError::Config(
                "circuit_breaker window sizes must be greater than 0".to_string(),
            ));
        }
        if breaker.minimum_calls > breaker.sliding_window_size {
            return Err(CatalogError::Config(format!(
                "circuit_breaker.minimum_calls ({}) cannot exceed sliding_window_size ({})",
                breaker.minimum_calls, breaker.sliding_window_size
            )));
        }
        if breaker.half_open_trial_calls == 0 {
            return Err(CatalogError::Config(
                "circuit_breaker.half_open_trial_calls must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_connect_timeout_ms() -> u64 {
    250
}

fn default_read_timeout_ms() -> u64 {
    500
}

/// Retry budget for one dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: BackoffSettings,

    #[serde(default)]
    pub jitter: JitterSettings,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffSettings::default(),
            jitter: JitterSettings::default(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

/// Shape of the delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffSettings {
    Fixed { delay_ms: u64 },
    Exponential { initial_ms: u64, multiplier: f64, max_ms: u64 },
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self::Exponential { initial_ms: 100, multiplier: 2.0, max_ms: 2_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JitterSettings {
    None,
    Full,
    #[default]
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkheadSettings {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for BulkheadSettings {
    fn default() -> Self {
        Self { max_concurrent: default_max_concurrent() }
    }
}

fn default_max_concurrent() -> usize {
    25
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_rate_threshold: f64,
    pub minimum_calls: usize,
    pub sliding_window_size: usize,
    pub open_timeout_secs: u64,
    pub half_open_trial_calls: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            minimum_calls: 10,
            sliding_window_size: 20,
            open_timeout_secs: 30,
            half_open_trial_calls: 3,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 600, max_entries: 10_000 }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Document store used for video search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchStoreConfig {
    /// Elasticsearch base URL; `None` selects the in-memory store
    pub base_url: Option<String>,
    pub index: String,
    pub request_timeout_ms: u64,
}

impl Default for SearchStoreConfig {
    fn default() -> Self {
        Self { base_url: None, index: "videos".to_string(), request_timeout_ms: 2_000 }
    }
}

impl SearchStoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.trim().is_empty() {
            return Err(CatalogError::Config("search.index cannot be empty".to_string()));
        }
        if matches!(&self.base_url, Some(url) if url.trim().is_empty()) {
            return Err(CatalogError::Config("search.base_url cannot be blank".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(CatalogError::Config(
                "search.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
