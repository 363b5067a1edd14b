//! Configuration structures
//!
//! Typed configuration for the engine, injected at construction time.
//! Defaults match the documented behavior of each subsystem; the infra
//! config loader fills these from environment variables or a config file.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_VOLUME, REMOTE_FLUSH_INTERVAL_SECS};
use crate::types::ToneKind;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub alerts: AlertSettings,
}

/// Local database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "repforge.db".to_string(), pool_size: 4 }
    }
}

/// Remote session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL for the remote session API
    pub base_url: String,
    /// Bearer token for the remote session API
    pub api_token: Option<String>,
    /// Interval between pending-flush checks, in seconds
    pub flush_interval_seconds: u64,
    /// Timeout for remote requests, in seconds
    pub request_timeout_seconds: u64,
    /// Whether remote sync is enabled
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.repforge.app/v1".to_string(),
            api_token: None,
            flush_interval_seconds: REMOTE_FLUSH_INTERVAL_SECS,
            request_timeout_seconds: 30,
            enabled: true,
        }
    }
}

/// User-facing alert preferences
///
/// Read-only from the engine's perspective. Defaults: sound on, vibration
/// on, volume 0.9, alarm pattern, background delivery and system
/// notifications enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub sound_type: ToneKind,
    /// Playback volume in `0.0..=1.0`
    pub volume: f32,
    /// Whether countdown tracking is handed off to the background context
    pub background_enabled: bool,
    /// Whether OS-level notifications are shown on completion
    pub use_system_notification: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            sound_type: ToneKind::Alarm,
            volume: DEFAULT_VOLUME,
            background_enabled: true,
            use_system_notification: true,
        }
    }
}
