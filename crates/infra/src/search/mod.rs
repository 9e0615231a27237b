//! Video store adapters

pub mod elasticsearch;
pub mod memory;

pub use elasticsearch::ElasticsearchVideoStore;
pub use memory::InMemoryVideoStore;
