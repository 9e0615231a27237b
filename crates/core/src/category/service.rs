//! Category use-cases over the resilient lookup client

use std::collections::HashSet;
use std::sync::Arc;

use catalog_common::time::{Clock, SystemClock};
use catalog_domain::{LookupError, ResourceSnapshot, CATEGORIES_DEPENDENCY};
use futures::stream::{self, StreamExt};
use tracing::{debug, instrument};

use crate::lookup::ResilientLookupClient;

/// Read access to the externally owned category registry
pub struct CategoryService<C: Clock = SystemClock> {
    client: Arc<ResilientLookupClient<C>>,
    dependency: String,
}

impl<C: Clock> CategoryService<C> {
    /// Service bound to the `categories` dependency
    pub fn new(client: Arc<ResilientLookupClient<C>>) -> Self {
        Self::for_dependency(client, CATEGORIES_DEPENDENCY)
    }

    pub fn for_dependency(client: Arc<ResilientLookupClient<C>>, dependency: &str) -> Self {
        Self { client, dependency: dependency.to_string() }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<ResourceSnapshot>, LookupError> {
        self.client.fetch(&self.dependency, id).await
    }

    /// Fetch several categories concurrently
    ///
    /// Duplicate ids are fetched once. At most the dependency's bulkhead
    /// capacity is in flight at a time. Missing categories are dropped and the
    /// rest keep request order. If any fetch fails, the first failure in
    /// request order is returned.
    #[instrument(skip(self, ids), fields(dependency = %self.dependency))]
    pub async fn get_all_by_id<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<ResourceSnapshot>, LookupError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> =
            ids.iter().map(AsRef::as_ref).filter(|id| seen.insert(*id)).collect();
        let width = self.fan_out_width();
        debug!(requested = ids.len(), distinct = distinct.len(), width, "Fetching categories");

        let outcomes: Vec<_> =
            stream::iter(distinct).map(|id| self.get_by_id(id)).buffered(width).collect().await;

        let mut found = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(snapshot) = outcome? {
                found.push(snapshot);
            }
        }
        Ok(found)
    }

    fn fan_out_width(&self) -> usize {
        self.client
            .registry()
            .get(&self.dependency)
            .map_or(1, |state| state.bulkhead().max_concurrent())
            .max(1)
    }

    /// Drop a cached category after it changed upstream
    pub fn invalidate(&self, id: &str) -> Result<(), LookupError> {
        self.client.invalidate(&self.dependency, id)
    }
}
