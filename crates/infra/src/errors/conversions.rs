//! Conversions from external infrastructure errors into domain errors.

use catalog_domain::{CatalogError, LookupError};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CatalogError);

impl From<InfraError> for CatalogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CatalogError> for InfraError {
    fn from(value: CatalogError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCatalogError {
    fn into_catalog(self) -> CatalogError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CatalogError (document store and client setup) */
/* -------------------------------------------------------------------------- */

impl IntoCatalogError for HttpError {
    fn into_catalog(self) -> CatalogError {
        if self.is_builder() {
            return CatalogError::Config(format!("invalid HTTP client configuration: {self}"));
        }

        if self.is_timeout() {
            return CatalogError::Store("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CatalogError::Store("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return CatalogError::Store(format!(
                "HTTP {} {}",
                code,
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        if self.is_decode() {
            return CatalogError::Store(format!("undecodable response body: {self}"));
        }

        CatalogError::Store(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_catalog())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LookupError (remote dependency calls) */
/* -------------------------------------------------------------------------- */

/// Classify a transport-level failure of one lookup attempt
///
/// This is the only place a `reqwest::Error` becomes a [`LookupError`]:
/// - connect phase deadline → `ConnectTimeout`
/// - request deadline → `ReadTimeout`
/// - body that does not decode → `InvalidResponse`
/// - anything else (refused, reset, DNS) → `Transport`
pub fn classify_transport_error(dependency: &str, id: &str, err: &HttpError) -> LookupError {
    let (dependency, id) = (dependency.to_string(), id.to_string());

    if err.is_connect() && err.is_timeout() {
        return LookupError::ConnectTimeout { dependency, id };
    }
    if err.is_timeout() {
        return LookupError::ReadTimeout { dependency, id };
    }
    if err.is_decode() {
        return LookupError::InvalidResponse { dependency, id, message: err.to_string() };
    }
    LookupError::Transport { dependency, id, message: err.to_string() }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
