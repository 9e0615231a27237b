//! Error types used throughout the catalog

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified outcome of a failed remote lookup
///
/// Classification happens once, where the transport response is inspected.
/// Every layer above (retry, circuit breaker, callers) works with these
/// variants and never with raw transport errors. Messages follow the format
/// operators grep for, e.g. `Error observed from categories [resourceId:123]
/// [status:500]`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupError {
    /// The remote resource does not exist
    #[error("Not found observed from {dependency} [resourceId:{id}]")]
    NotFound { dependency: String, id: String },

    /// The remote answered with a server error
    #[error("Error observed from {dependency} [resourceId:{id}] [status:{status}]")]
    UpstreamFailure { dependency: String, id: String, status: u16 },

    #[error("ConnectTimeout observed from {dependency} [resourceId:{id}]")]
    ConnectTimeout { dependency: String, id: String },

    #[error("Timeout observed from {dependency} [resourceId:{id}]")]
    ReadTimeout { dependency: String, id: String },

    /// Every bulkhead permit for the dependency is in use
    #[error("Bulkhead saturated for {dependency}")]
    BulkheadRejected { dependency: String },

    /// The circuit breaker for the dependency is refusing calls
    #[error("Circuit open for {dependency}")]
    CircuitOpen { dependency: String },

    /// Any other transport-level fault
    #[error("Error observed from {dependency} [resourceId:{id}]: {message}")]
    Transport { dependency: String, id: String, message: String },

    #[error("Invalid lookup request for {dependency}: {reason}")]
    InvalidRequest { dependency: String, reason: String },

    #[error("Unknown dependency: {dependency}")]
    UnknownDependency { dependency: String },

    /// The remote answered, but not with anything the contract allows
    #[error("Invalid response from {dependency} [resourceId:{id}]: {message}")]
    InvalidResponse { dependency: String, id: String, message: String },
}

/// Fieldless discriminant of [`LookupError`], handy for metrics and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    NotFound,
    UpstreamFailure,
    ConnectTimeout,
    ReadTimeout,
    BulkheadRejected,
    CircuitOpen,
    Transport,
    InvalidRequest,
    UnknownDependency,
    InvalidResponse,
}

impl LookupErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::UpstreamFailure => "upstream_failure",
            Self::ConnectTimeout => "connect_timeout",
            Self::ReadTimeout => "read_timeout",
            Self::BulkheadRejected => "bulkhead_rejected",
            Self::CircuitOpen => "circuit_open",
            Self::Transport => "transport",
            Self::InvalidRequest => "invalid_request",
            Self::UnknownDependency => "unknown_dependency",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LookupError {
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            Self::NotFound { .. } => LookupErrorKind::NotFound,
            Self::UpstreamFailure { .. } => LookupErrorKind::UpstreamFailure,
            Self::ConnectTimeout { .. } => LookupErrorKind::ConnectTimeout,
            Self::ReadTimeout { .. } => LookupErrorKind::ReadTimeout,
            Self::BulkheadRejected { .. } => LookupErrorKind::BulkheadRejected,
            Self::CircuitOpen { .. } => LookupErrorKind::CircuitOpen,
            Self::Transport { .. } => LookupErrorKind::Transport,
            Self::InvalidRequest { .. } => LookupErrorKind::InvalidRequest,
            Self::UnknownDependency { .. } => LookupErrorKind::UnknownDependency,
            Self::InvalidResponse { .. } => LookupErrorKind::InvalidResponse,
        }
    }

    /// Whether re-issuing the same call may succeed
    ///
    /// Timeouts, 5xx answers and generic transport faults qualify. Saturation
    /// and open-circuit rejections never do: retrying them adds load to a
    /// dependency that is already struggling.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFailure { .. }
                | Self::ConnectTimeout { .. }
                | Self::ReadTimeout { .. }
                | Self::Transport { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Capacity or availability signal rather than a data error
    pub fn is_availability_signal(&self) -> bool {
        matches!(self, Self::BulkheadRejected { .. } | Self::CircuitOpen { .. })
    }

    /// Name of the dependency the error was observed from
    pub fn dependency(&self) -> &str {
        match self {
            Self::NotFound { dependency, .. }
            | Self::UpstreamFailure { dependency, .. }
            | Self::ConnectTimeout { dependency, .. }
            | Self::ReadTimeout { dependency, .. }
            | Self::BulkheadRejected { dependency }
            | Self::CircuitOpen { dependency }
            | Self::Transport { dependency, .. }
            | Self::InvalidRequest { dependency, .. }
            | Self::UnknownDependency { dependency }
            | Self::InvalidResponse { dependency, .. } => dependency,
        }
    }
}

/// Main error type for the catalog
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
