//! # Catalog Core
//!
//! Business logic layer for the catalog gateway - no HTTP or store code.
//!
//! This crate contains:
//! - The resilient read-through lookup client and its dependency registry
//! - The video search query builder and search use-case
//! - Category use-cases
//! - Port interfaces (traits) implemented by the infra crate
//!
//! ## Architecture Principles
//! - Depends only on `catalog-common` and `catalog-domain`
//! - All external systems reached through traits
//! - Time read through `catalog_common::time::Clock`

pub mod category;
pub mod lookup;
pub mod search;

pub use category::CategoryService;
pub use lookup::{
    DependencyRegistry, DependencyRegistryBuilder, DependencyState, LookupTransport,
    ResilientLookupClient,
};
pub use search::{
    Clause, ClauseValue, PageRequest, QueryDescription, RawSearchPage, SortOrder, VideoSearchService,
    VideoStore,
};
