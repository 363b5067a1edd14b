//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Alert deduplication
pub const ALERT_COOLDOWN_MS: u64 = 5_000;
pub const DEDUP_EVICTION_MARGIN_MS: u64 = 500;

// Rest timer behavior
pub const FALLBACK_TICK_MS: u64 = 100;
pub const BACKGROUND_GRACE_MS: u64 = 500;
pub const COMPLETE_DISPLAY_SECS: u64 = 3;

// Background context coordination
pub const STATUS_QUERY_MIN_INTERVAL_SECS: u64 = 2;
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = 25;
pub const KEEP_ALIVE_TIMEOUT_MS: u64 = 1_000;
pub const COMPLETED_TIMER_RETENTION_SECS: u64 = 60;

// Session persistence
pub const REMOTE_FLUSH_INTERVAL_SECS: u64 = 10;
pub const LOCAL_CACHE_STALE_HOURS: i64 = 24;

// Alert defaults
pub const DEFAULT_VOLUME: f32 = 0.9;
pub const DEFAULT_VIBRATION_PATTERN: &[u64] = &[300, 100, 300, 100, 300];
