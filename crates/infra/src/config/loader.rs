//! Configuration loader
//!
//! Loads gateway configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `CATALOG_CATEGORIES_BASE_URL`: Category registry base URL (required)
//! - `CATALOG_CATEGORIES_READ_TIMEOUT_MS`: Read timeout in milliseconds
//! - `CATALOG_CATEGORIES_CONNECT_TIMEOUT_MS`: Connect timeout in milliseconds
//! - `CATALOG_CATEGORIES_MAX_ATTEMPTS`: Attempts per lookup, first one included
//! - `CATALOG_CATEGORIES_BULKHEAD_MAX_CONCURRENT`: Concurrent call cap
//! - `CATALOG_CATEGORIES_CACHE_TTL_SECS`: Snapshot cache TTL in seconds
//! - `CATALOG_SEARCH_BASE_URL`: Elasticsearch URL (in-memory store if unset)
//! - `CATALOG_SEARCH_INDEX`: Video index name
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./catalog.json` or `./catalog.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use catalog_domain::{
    CatalogConfig, CatalogError, DependencyConfig, Result, CATEGORIES_DEPENDENCY,
};

const PREFIX: &str = "CATALOG_CATEGORIES";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CatalogError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Values fail validation
pub fn load() -> Result<CatalogConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the category base URL is required; every other value falls back to
/// the reference defaults.
///
/// # Errors
/// Returns `CatalogError::Config` if the base URL is missing or a value does
/// not parse.
pub fn load_from_env() -> Result<CatalogConfig> {
    let mut categories = DependencyConfig::new(env_var(&format!("{PREFIX}_BASE_URL"))?);

    if let Some(ms) = env_parse::<u64>(&format!("{PREFIX}_READ_TIMEOUT_MS"))? {
        categories.read_timeout_ms = ms;
    }
    if let Some(ms) = env_parse::<u64>(&format!("{PREFIX}_CONNECT_TIMEOUT_MS"))? {
        categories.connect_timeout_ms = ms;
    }
    if let Some(attempts) = env_parse::<u32>(&format!("{PREFIX}_MAX_ATTEMPTS"))? {
        categories.retry.max_attempts = attempts;
    }
    if let Some(max) = env_parse::<usize>(&format!("{PREFIX}_BULKHEAD_MAX_CONCURRENT"))? {
        categories.bulkhead.max_concurrent = max;
    }
    if let Some(secs) = env_parse::<u64>(&format!("{PREFIX}_CACHE_TTL_SECS"))? {
        categories.cache.ttl_secs = secs;
    }

    let mut config = CatalogConfig::default();
    config.dependencies.insert(CATEGORIES_DEPENDENCY.to_string(), categories);
    config.search.base_url = std::env::var("CATALOG_SEARCH_BASE_URL").ok();
    if let Ok(index) = std::env::var("CATALOG_SEARCH_INDEX") {
        config.search.index = index;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CatalogError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Values fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<CatalogConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CatalogError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CatalogError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CatalogError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<CatalogConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CatalogError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CatalogError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CatalogError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = [
        "catalog.json",
        "catalog.toml",
        "config.json",
        "config.toml",
        "../config.json",
        "../config.toml",
        "../../config.json",
        "../../config.toml",
    ];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(names.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(names.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CatalogError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable; unset is `None`, unparsable is an error
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CatalogError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
