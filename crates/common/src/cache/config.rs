//! Cache configuration types and builder

/// Configuration for cache behavior
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Maximum number of entries (None = unlimited)
    pub max_entries: Option<usize>,

    /// Whether to collect hit/miss/eviction counters
    pub track_metrics: bool,
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Bounded cache with metrics enabled
    ///
    /// # Example
    /// ```
    /// use catalog_common::cache::CacheConfig;
    ///
    /// let config = CacheConfig::bounded(1000);
    /// assert_eq!(config.max_entries, Some(1000));
    /// ```
    pub fn bounded(max_entries: usize) -> Self {
        Self { max_entries: Some(max_entries), track_metrics: true }
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Set maximum number of entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.config.max_entries = Some(max);
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
