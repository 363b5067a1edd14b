//! Alert primitives
//!
//! Stateless synthesis of audible and haptic alerts, dispatched through
//! port traits implemented by the infra layer. Nothing here persists
//! state, and nothing here returns an error to the caller: a missed alert
//! must never crash the timer flow.

pub mod patterns;
pub mod ports;
pub mod service;

pub use patterns::{synthesize, SAMPLE_RATE};
pub use ports::{SystemNotifier, TonePlayer, VibrationDevice};
pub use service::AlertService;
