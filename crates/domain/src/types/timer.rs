//! Rest timer types
//!
//! Ephemeral countdown state. Rest timers are never persisted to the remote
//! store; they exist for the lifetime of one rest period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which delivery path fired the user-facing alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSource {
    /// No alert has been dispatched yet
    #[default]
    None,
    /// The background execution context detected completion
    BackgroundContext,
    /// The local fallback clock detected completion
    LocalFallback,
}

/// Rest timer state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Counting down; background handoff attempted, fallback clock ticking
    Armed,
    /// A completion signal arrived; alert dispatch in progress
    CompletionPending,
    /// Alert dispatched (or suppressed as already-sent); terminal
    Completed,
    /// User skipped the rest period; terminal, no alert
    Skipped,
}

/// One rest-period countdown record
///
/// `completed` transitions false to true exactly once, and `dispatched_by`
/// is written at most once, for deduplication auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestTimer {
    pub timer_id: String,
    pub start_timestamp: DateTime<Utc>,
    pub duration_seconds: u32,
    /// Carried-over elapsed time, reserved for pause semantics
    pub accumulated_seconds: u32,
    pub completed: bool,
    pub dispatched_by: NotificationSource,
}

impl RestTimer {
    /// Create a new armed timer with a fresh identifier.
    pub fn new(duration_seconds: u32, start_timestamp: DateTime<Utc>) -> Self {
        Self {
            timer_id: Uuid::new_v4().to_string(),
            start_timestamp,
            duration_seconds,
            accumulated_seconds: 0,
            completed: false,
            dispatched_by: NotificationSource::None,
        }
    }
}

/// Point-in-time view of a controller-owned timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub remaining_seconds: u32,
    pub dispatched_by: NotificationSource,
}

/// Completion event emitted by the background execution context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCompletion {
    pub timer_id: String,
    pub completed: bool,
    /// Whether the background context already showed the OS notification
    pub notification_sent: bool,
}

/// Point-in-time status of a background-tracked timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTimerStatus {
    pub timer_id: String,
    pub remaining_seconds: u32,
    pub completed: bool,
    pub notification_sent: bool,
}

/// Short audio pattern kinds the alert layer can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToneKind {
    /// Multi-burst rising-pitch alarm
    #[default]
    Alarm,
    /// Soft chord
    Bell,
    /// Simple triple beep
    Beep,
}
