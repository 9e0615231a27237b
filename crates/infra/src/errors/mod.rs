//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{classify_transport_error, InfraError};
