//! Gateway wiring
//!
//! Builds every collaborator once from a [`CatalogConfig`] and hands out
//! shared handles.

use std::sync::Arc;

use catalog_core::lookup::{DependencyRegistry, ResilientLookupClient};
use catalog_core::search::{VideoSearchService, VideoStore};
use catalog_core::CategoryService;
use catalog_domain::{CatalogConfig, CatalogError, Result, CATEGORIES_DEPENDENCY};
use tracing::info;

use crate::integrations::CategoryRestClient;
use crate::search::{ElasticsearchVideoStore, InMemoryVideoStore};

/// Fully wired catalog gateway
pub struct CatalogGateway {
    registry: Arc<DependencyRegistry>,
    lookup: Arc<ResilientLookupClient>,
    categories: CategoryService,
    store: Arc<dyn VideoStore>,
    videos: VideoSearchService,
}

impl CatalogGateway {
    /// Validate `config` and build the gateway
    ///
    /// One REST transport is created per configured dependency. The video
    /// store is Elasticsearch when `search.base_url` is set and in-memory
    /// otherwise.
    ///
    /// # Errors
    /// Returns `CatalogError::Config` for invalid configuration, including a
    /// missing `categories` dependency.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        config.validate()?;
        if !config.dependencies.contains_key(CATEGORIES_DEPENDENCY) {
            return Err(CatalogError::Config(format!(
                "dependency '{CATEGORIES_DEPENDENCY}' is not configured"
            )));
        }

        let mut builder = DependencyRegistry::builder();
        for (name, dependency) in &config.dependencies {
            builder = builder.register(name, dependency)?;
        }
        let registry = Arc::new(builder.build());

        let mut lookup = ResilientLookupClient::new(registry.clone());
        for (name, dependency) in &config.dependencies {
            let transport = CategoryRestClient::from_config(name.as_str(), dependency)?;
            lookup = lookup.with_transport(name, Arc::new(transport))?;
        }
        let lookup = Arc::new(lookup);

        let store: Arc<dyn VideoStore> = match &config.search.base_url {
            Some(url) => {
                info!(url = %url, index = %config.search.index, "Using Elasticsearch video store");
                Arc::new(ElasticsearchVideoStore::from_config(&config.search)?)
            }
            None => {
                info!("Using in-memory video store");
                Arc::new(InMemoryVideoStore::new())
            }
        };

        info!(dependencies = ?registry.names(), "Catalog gateway ready");

        Ok(Self {
            categories: CategoryService::new(lookup.clone()),
            videos: VideoSearchService::new(store.clone()),
            registry,
            lookup,
            store,
        })
    }

    pub fn registry(&self) -> &Arc<DependencyRegistry> {
        &self.registry
    }

    pub fn lookup(&self) -> &Arc<ResilientLookupClient> {
        &self.lookup
    }

    pub fn categories(&self) -> &CategoryService {
        &self.categories
    }

    pub fn store(&self) -> &Arc<dyn VideoStore> {
        &self.store
    }

    pub fn videos(&self) -> &VideoSearchService {
        &self.videos
    }
}
