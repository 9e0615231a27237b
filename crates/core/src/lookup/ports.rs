//! Port interfaces for remote resource lookups
//!
//! The lookup client only sees this trait; HTTP lives in the infra crate.

use async_trait::async_trait;
use catalog_domain::{LookupError, ResourceSnapshot};

/// Single fetch-by-id call against one remote dependency
///
/// Implementations classify every failure into [`LookupError`] before
/// returning. A missing resource is reported as [`LookupError::NotFound`];
/// the client turns that into an empty result.
#[async_trait]
pub trait LookupTransport: Send + Sync {
    /// Name of the dependency this transport talks to, used in error messages
    fn namespace(&self) -> &str;

    /// Perform exactly one attempt to fetch the resource
    async fn get_by_id(&self, id: &str) -> Result<ResourceSnapshot, LookupError>;
}
