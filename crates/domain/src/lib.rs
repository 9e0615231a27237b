//! # Catalog Domain
//!
//! Business domain types for the catalog gateway.
//!
//! This crate contains:
//! - Remote resource snapshots and video records
//! - Search criteria and result pages
//! - The lookup error taxonomy and the crate-wide error type
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other catalog crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
