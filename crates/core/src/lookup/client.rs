//! Resilient remote lookup client
//!
//! `fetch(dependency, id)` runs, in order and short-circuiting:
//! cache → bulkhead → circuit breaker → retried transport call. A not-found
//! answer is an empty result and is never cached; every other failure reaches
//! the caller as one classified [`LookupError`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use catalog_common::time::{Clock, SystemClock};
use catalog_domain::{LookupError, ResourceSnapshot};
use tracing::{debug, instrument, warn};

use super::ports::LookupTransport;
use super::registry::DependencyRegistry;

/// Read-through client over every registered dependency
pub struct ResilientLookupClient<C: Clock = SystemClock> {
    registry: Arc<DependencyRegistry<C>>,
    transports: HashMap<String, Arc<dyn LookupTransport>>,
}

impl<C: Clock> ResilientLookupClient<C> {
    pub fn new(registry: Arc<DependencyRegistry<C>>) -> Self {
        Self { registry, transports: HashMap::new() }
    }

    /// Attach the transport for a registered dependency
    ///
    /// # Errors
    /// `LookupError::UnknownDependency` if the name was never registered.
    pub fn with_transport(
        mut self,
        dependency: &str,
        transport: Arc<dyn LookupTransport>,
    ) -> Result<Self, LookupError> {
        if self.registry.get(dependency).is_none() {
            return Err(LookupError::UnknownDependency { dependency: dependency.to_string() });
        }
        self.transports.insert(dependency.to_string(), transport);
        Ok(self)
    }

    pub fn registry(&self) -> &Arc<DependencyRegistry<C>> {
        &self.registry
    }

    /// Fetch one resource by id
    ///
    /// Returns `Ok(None)` when the remote reports the resource as missing.
    ///
    /// # Errors
    /// - `InvalidRequest` for a blank id
    /// - `UnknownDependency` for an unregistered name or one without transport
    /// - `BulkheadRejected` / `CircuitOpen` without any transport attempt
    /// - the last classified transport failure once retries stop
    #[instrument(skip(self), fields(dependency = %dependency, resource_id = %id))]
    pub async fn fetch(
        &self,
        dependency: &str,
        id: &str,
    ) -> Result<Option<ResourceSnapshot>, LookupError> {
        let unknown = || LookupError::UnknownDependency { dependency: dependency.to_string() };
        let state = self.registry.get(dependency).ok_or_else(unknown)?;
        let transport = self.transports.get(dependency).ok_or_else(unknown)?;

        if id.trim().is_empty() {
            return Err(LookupError::InvalidRequest {
                dependency: dependency.to_string(),
                reason: "resource id cannot be empty".to_string(),
            });
        }

        if let Some(snapshot) = state.cache().get(&id.to_string()) {
            debug!("Cache hit");
            return Ok(Some(snapshot));
        }

        let Some(permit) = state.bulkhead().try_acquire() else {
            warn!(
                max_concurrent = state.bulkhead().max_concurrent(),
                "Bulkhead rejected lookup"
            );
            return Err(LookupError::BulkheadRejected { dependency: dependency.to_string() });
        };

        let Some(call) = state.breaker().try_acquire() else {
            warn!(state = %state.breaker().state(), "Circuit breaker rejected lookup");
            return Err(LookupError::CircuitOpen { dependency: dependency.to_string() });
        };

        let outcome = state
            .retry()
            .execute_with_outcome(|attempt| {
                debug!(attempt, "Calling remote");
                transport.get_by_id(id)
            })
            .await;

        let result = match outcome.result {
            Ok(snapshot) => {
                call.record_success();
                state.cache().put(id.to_string(), snapshot.clone(), state.cache_ttl());
                debug!(attempts = outcome.attempts, "Lookup succeeded");
                Ok(Some(snapshot))
            }
            Err(error) if error.is_not_found() => {
                call.record_success();
                debug!("Remote resource not found");
                Ok(None)
            }
            Err(error) => {
                call.record_failure();
                warn!(
                    attempts = outcome.attempts,
                    kind = %error.kind(),
                    error = %error,
                    "Lookup failed"
                );
                Err(error)
            }
        };

        permit.release();
        result
    }

    /// Drop a cached snapshot so the next fetch goes to the remote
    pub fn invalidate(&self, dependency: &str, id: &str) -> Result<(), LookupError> {
        let state = self
            .registry
            .get(dependency)
            .ok_or_else(|| LookupError::UnknownDependency { dependency: dependency.to_string() })?;
        state.cache().invalidate(&id.to_string());
        Ok(())
    }
}

impl<C: Clock> fmt::Debug for ResilientLookupClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut transports: Vec<&str> = self.transports.keys().map(String::as_str).collect();
        transports.sort_unstable();
        f.debug_struct("ResilientLookupClient").field("transports", &transports).finish()
    }
}
