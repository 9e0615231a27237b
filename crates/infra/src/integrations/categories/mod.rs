//! Category registry REST integration

pub mod client;
pub mod models;

pub use client::CategoryRestClient;
pub use models::CategoryDto;
