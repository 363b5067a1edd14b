//! Rest timer engine
//!
//! One controller per rest period, coordinating a background countdown
//! with a local fallback clock and guaranteeing exactly one alert per
//! timer through the deduplication guard.

pub mod controller;
pub mod dedup;
pub mod ports;

pub use controller::{
    format_remaining, remaining_secs, RestTimerConfig, RestTimerController, RestTimerDeps,
};
pub use dedup::AlertDedupGuard;
pub use ports::BackgroundTimers;
