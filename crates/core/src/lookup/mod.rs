//! Resilient read-through lookups against remote dependencies

pub mod client;
pub mod ports;
pub mod registry;

pub use client::ResilientLookupClient;
pub use ports::LookupTransport;
pub use registry::{DependencyRegistry, DependencyRegistryBuilder, DependencyState, LookupRetry};
