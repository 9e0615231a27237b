//! Category use-cases

pub mod service;

pub use service::CategoryService;
