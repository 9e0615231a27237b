//! REST transport for the category registry

use async_trait::async_trait;
use catalog_core::lookup::LookupTransport;
use catalog_domain::config::DependencyConfig;
use catalog_domain::{CatalogError, LookupError, ResourceSnapshot};
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use super::models::CategoryDto;
use crate::errors::classify_transport_error;
use crate::http::HttpClient;

/// Single-attempt `GET {base_url}/{id}` against one dependency
///
/// Status handling:
/// - 200 → decoded snapshot
/// - 404 → `NotFound`
/// - 5xx → `UpstreamFailure` carrying the status
/// - anything else → `InvalidResponse`
#[derive(Debug, Clone)]
pub struct CategoryRestClient {
    http_client: HttpClient,
    base_url: Url,
    namespace: String,
}

impl CategoryRestClient {
    /// Create a client for `namespace` rooted at `base_url`
    ///
    /// # Errors
    /// Returns `CatalogError::Config` if `base_url` is not an absolute
    /// hierarchical URL.
    pub fn new(
        namespace: impl Into<String>,
        base_url: &str,
        http_client: HttpClient,
    ) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::Config(format!("Invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Config(format!("Base URL '{base_url}' cannot hold a path")));
        }
        Ok(Self { http_client, base_url, namespace: namespace.into() })
    }

    /// Build the HTTP client from a dependency's timeouts
    ///
    /// The request deadline covers connect plus read.
    pub fn from_config(
        namespace: impl Into<String>,
        config: &DependencyConfig,
    ) -> Result<Self, CatalogError> {
        let http_client = HttpClient::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.connect_timeout() + config.read_timeout())
            .user_agent(concat!("catalog-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::new(namespace, &config.base_url, http_client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resource_url(&self, id: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidRequest {
                dependency: self.namespace.clone(),
                reason: format!("base URL '{}' cannot hold a path", self.base_url),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl LookupTransport for CategoryRestClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_by_id(&self, id: &str) -> Result<ResourceSnapshot, LookupError> {
        let url = self.resource_url(id)?;
        let request = self.http_client.request(Method::GET, url);
        let response = self
            .http_client
            .send(request)
            .await
            .map_err(|e| classify_transport_error(&self.namespace, id, &e))?;

        let status = response.status();
        let (dependency, resource_id) = (self.namespace.clone(), id.to_string());
        match status {
            StatusCode::OK => {
                let dto: CategoryDto = response
                    .json()
                    .await
                    .map_err(|e| classify_transport_error(&self.namespace, id, &e))?;
                debug!(dependency = %self.namespace, resource_id = id, "Decoded category");
                Ok(dto.into())
            }
            StatusCode::NOT_FOUND => Err(LookupError::NotFound { dependency, id: resource_id }),
            s if s.is_server_error() => Err(LookupError::UpstreamFailure {
                dependency,
                id: resource_id,
                status: s.as_u16(),
            }),
            s => Err(LookupError::InvalidResponse {
                dependency,
                id: resource_id,
                message: format!("unexpected status {s}"),
            }),
        }
    }
}
