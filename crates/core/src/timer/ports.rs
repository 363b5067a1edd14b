//! Port interfaces for background countdown tracking

use async_trait::async_trait;
use repforge_domain::{BackgroundTimerStatus, TimerCompletion};
use tokio::sync::broadcast;

/// Countdown tracking delegated to a background execution context that
/// outlives the visible page.
///
/// Implementations must tolerate the context being entirely absent: every
/// call degrades to a no-op or `false`, and the caller runs its own
/// fallback countdown unconditionally.
#[async_trait]
pub trait BackgroundTimers: Send + Sync {
    /// Hand off countdown tracking for a timer.
    ///
    /// Returns `false` when the background context is unavailable; the
    /// caller must then rely entirely on its local fallback.
    async fn start_timer(&self, timer_id: &str, duration_seconds: u32, label: &str) -> bool;

    /// Best-effort cancellation; safe to call without a prior start.
    async fn cancel_timer(&self, timer_id: &str);

    /// Point-in-time status query.
    ///
    /// Implementations rate-limit the underlying round-trip and may
    /// return a cached answer inside the rate window.
    async fn timer_status(&self, timer_id: &str) -> Option<BackgroundTimerStatus>;

    /// Whether the background context already showed the OS notification
    /// for this timer. `false` when the context is unavailable.
    async fn notification_sent(&self, timer_id: &str) -> bool;

    /// Subscribe to completion events. Dropping the receiver unregisters
    /// the listener.
    fn subscribe_completions(&self) -> broadcast::Receiver<TimerCompletion>;
}
