//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `REPFORGE_DB_PATH`: Database file path (required for env loading)
//! - `REPFORGE_DB_POOL_SIZE`: Connection pool size
//! - `REPFORGE_SYNC_BASE_URL`: Session API base URL (required for env loading)
//! - `REPFORGE_SYNC_API_TOKEN`: Session API bearer token
//! - `REPFORGE_SYNC_INTERVAL`: Flush interval in seconds
//! - `REPFORGE_SYNC_TIMEOUT`: Request timeout in seconds
//! - `REPFORGE_SYNC_ENABLED`: Whether remote sync is enabled (true/false)
//!
//! Alert preferences have no environment mapping; they come from the
//! config file or fall back to their documented defaults.

use std::path::{Path, PathBuf};

use repforge_domain::{Config, DatabaseConfig, RepForgeError, Result, SyncConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `RepForgeError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
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
/// `REPFORGE_DB_PATH` and `REPFORGE_SYNC_BASE_URL` must be present; the
/// remaining variables fall back to their defaults.
///
/// # Errors
/// Returns `RepForgeError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("REPFORGE_DB_PATH")?;
    let base_url = env_var("REPFORGE_SYNC_BASE_URL")?;

    let defaults = Config::default();

    let pool_size = env_parse("REPFORGE_DB_POOL_SIZE", defaults.database.pool_size)?;
    let flush_interval =
        env_parse("REPFORGE_SYNC_INTERVAL", defaults.sync.flush_interval_seconds)?;
    let request_timeout =
        env_parse("REPFORGE_SYNC_TIMEOUT", defaults.sync.request_timeout_seconds)?;
    let enabled = env_bool("REPFORGE_SYNC_ENABLED", defaults.sync.enabled);
    let api_token = std::env::var("REPFORGE_SYNC_API_TOKEN").ok();

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        sync: SyncConfig {
            base_url,
            api_token,
            flush_interval_seconds: flush_interval,
            request_timeout_seconds: request_timeout,
            enabled,
        },
        alerts: defaults.alerts,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RepForgeError::Config` if no file is found or the file is
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RepForgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RepForgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");
    parse_config_file(&config_path)
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| RepForgeError::Config(format!("Failed to read config file: {e}")))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| RepForgeError::Config(format!("Invalid TOML config: {e}"))),
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| RepForgeError::Config(format!("Invalid JSON config: {e}"))),
        _ => Err(RepForgeError::Config(format!(
            "Unsupported config format: {}",
            path.display()
        ))),
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    let names = ["config.toml", "config.json", "repforge.toml", "repforge.json"];
    let bases = [PathBuf::from("."), PathBuf::from("..")];

    for base in &bases {
        for name in &names {
            let candidate = base.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| RepForgeError::Config(format!("Missing environment variable: {name}")))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| RepForgeError::Config(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
