//! Shared test helpers for `catalog-core` integration tests.
//!
//! Fake transports and fixtures so that lookup tests can focus on behaviour
//! instead of boilerplate.

#![allow(dead_code)]

pub mod transports;

use std::sync::Arc;

use catalog_common::time::MockClock;
use catalog_core::lookup::{DependencyRegistryBuilder, LookupTransport, ResilientLookupClient};
use catalog_domain::config::{BackoffSettings, DependencyConfig, JitterSettings};
use catalog_domain::ResourceSnapshot;
use chrono::{TimeZone, Utc};

pub const CATEGORIES: &str = "categories";

/// Snapshot fixture with stable timestamps
pub fn snapshot(id: &str) -> ResourceSnapshot {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    ResourceSnapshot {
        id: id.to_string(),
        name: format!("Category {id}"),
        description: Some("Fixture".to_string()),
        active: true,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

/// Default dependency settings with backoff removed so tests never sleep
pub fn fast_config() -> DependencyConfig {
    let mut config = DependencyConfig::new("http://categories.test/api/categories");
    config.retry.backoff = BackoffSettings::Fixed { delay_ms: 0 };
    config.retry.jitter = JitterSettings::None;
    config
}

/// Lookup client with one `categories` dependency on a mock clock
pub fn client_with(
    config: &DependencyConfig,
    transport: Arc<dyn LookupTransport>,
) -> (ResilientLookupClient<MockClock>, MockClock) {
    let clock = MockClock::new();
    let registry = DependencyRegistryBuilder::with_clock(clock.clone())
        .register(CATEGORIES, config)
        .unwrap()
        .build();
    let client = ResilientLookupClient::new(Arc::new(registry))
        .with_transport(CATEGORIES, transport)
        .unwrap();
    (client, clock)
}
