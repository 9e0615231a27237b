//! External service integrations

pub mod categories;

pub use categories::{CategoryDto, CategoryRestClient};
