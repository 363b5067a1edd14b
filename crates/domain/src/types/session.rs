//! Workout session types
//!
//! The in-progress workout record persisted both to the local cache and the
//! remote store. All timestamps are fully-qualified UTC; naive timestamps
//! are never written or guessed at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An in-progress workout session
///
/// At most one active session exists per user; the remote store enforces
/// this with an upsert keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Assigned by the remote store on first successful write
    pub session_id: Option<String>,
    pub user_id: String,
    /// Workout-plan assignment being executed
    pub plan_assignment_id: String,
    /// Display label, denormalized for offline display
    pub plan_name: String,
    pub exercises: Vec<ExerciseProgress>,
    pub started_at: DateTime<Utc>,
    /// Time elapsed while not paused, in seconds
    pub accumulated_active_seconds: i64,
    pub paused: bool,
    /// Timestamp of last mutation, used for staleness checks
    pub last_modified_at: DateTime<Utc>,
}

/// Per-exercise progress embedded in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    pub target_sets: u32,
    pub target_reps: String,
    /// Configured rest period between sets, in seconds
    pub rest_seconds: u32,
    /// One entry per configured set; `done` never reverts to false
    pub sets_performed: Vec<SetRecord>,
}

/// A single set within an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: u32,
    pub done: bool,
}

impl ExerciseProgress {
    /// Build a progress record with one empty set per configured set count.
    pub fn with_empty_sets(
        exercise_id: impl Into<String>,
        name: impl Into<String>,
        muscle_group: impl Into<String>,
        target_sets: u32,
        target_reps: impl Into<String>,
        rest_seconds: u32,
    ) -> Self {
        let sets_performed = (1..=target_sets)
            .map(|set_number| SetRecord { set_number, weight: None, reps: 0, done: false })
            .collect();

        Self {
            exercise_id: exercise_id.into(),
            name: name.into(),
            muscle_group: muscle_group.into(),
            target_sets,
            target_reps: target_reps.into(),
            rest_seconds,
            sets_performed,
        }
    }
}
