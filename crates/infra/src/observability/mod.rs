//! Tracing subscriber setup
//!
//! Installs a global `tracing-subscriber` registry filtered by `RUST_LOG`
//! (default `info`) with either human-readable or JSON output.

use std::fmt;
use std::str::FromStr;

use catalog_domain::CatalogError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(CatalogError::Config(format!("Unknown log format: {other}"))),
        }
    }
}

/// Install the global subscriber
///
/// Returns `false` when a global subscriber was already set; the existing one
/// is kept.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => registry.with(fmt_layer::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt_layer::layer().json().with_current_span(true).with_target(true))
            .try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(%format, "Tracing initialized");
            true
        }
        Err(_) => {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
            false
        }
    }
}
