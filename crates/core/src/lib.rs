//! # RepForge Core
//!
//! Business logic for the workout-session continuity and rest-timer engine.
//!
//! This crate contains:
//! - Alert primitives (tone synthesis, vibration, notification ports)
//! - The alert deduplication guard
//! - The rest-timer controller state machine
//! - The session persistence service and its ports
//! - The clock abstraction used for testable wall-clock math
//!
//! ## Architecture
//! - Depends only on `repforge-domain` and external crates
//! - Side-effecting adapters live behind port traits implemented in
//!   `repforge-infra`

pub mod alerts;
pub mod session;
pub mod time;
pub mod timer;

pub use alerts::{AlertService, SystemNotifier, TonePlayer, VibrationDevice};
pub use session::{SessionCache, SessionService, SessionStore};
pub use time::{Clock, MockClock, SystemClock};
pub use timer::{AlertDedupGuard, BackgroundTimers, RestTimerConfig, RestTimerController};
