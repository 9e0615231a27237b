//! # Catalog Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client and the category registry REST transport
//! - Elasticsearch and in-memory video stores
//! - Configuration loading and tracing setup
//! - Bootstrap wiring for the whole gateway
//!
//! ## Architecture
//! - Implements traits defined in `catalog-core`
//! - Contains all "impure" code (network I/O, files, environment)

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;
pub mod search;

// Re-export commonly used items
pub use bootstrap::CatalogGateway;
pub use errors::{classify_transport_error, InfraError};
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::{CategoryDto, CategoryRestClient};
pub use observability::{init_tracing, LogFormat};
pub use search::{ElasticsearchVideoStore, InMemoryVideoStore};
