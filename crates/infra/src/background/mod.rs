//! Background countdown tracking
//!
//! A persistent worker task owns the countdown registry and outlives the
//! visible page logic; the coordinator is the page-side handle that
//! implements the core `BackgroundTimers` port over message passing. No
//! shared-memory mutation crosses the boundary.

pub mod coordinator;
pub mod worker;

pub use coordinator::BackgroundTimerCoordinator;
pub use worker::{BackgroundTimerWorker, TimerCommand};
