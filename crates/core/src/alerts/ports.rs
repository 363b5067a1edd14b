//! Port interfaces for alert delivery

use async_trait::async_trait;
use repforge_domain::Result;

/// Plays synthesized PCM samples through the platform audio output.
///
/// Implementations lazily create and reuse their playback handle, and
/// re-initialize it if the previous one went stale.
pub trait TonePlayer: Send + Sync {
    /// Play mono f32 samples at the given sample rate.
    fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Issues device vibration patterns where the platform supports them.
pub trait VibrationDevice: Send + Sync {
    /// Whether this device can vibrate at all.
    fn is_supported(&self) -> bool;

    /// Vibrate following an on/off millisecond pattern.
    fn vibrate(&self, pattern: &[u64]) -> Result<()>;
}

/// Shows OS-level notifications.
#[async_trait]
pub trait SystemNotifier: Send + Sync {
    /// Best-effort permission request; absence degrades silently to
    /// sound/vibration-only alerting.
    async fn request_permission(&self) -> bool;

    /// Show a notification with the given title and body.
    async fn notify(&self, title: &str, body: &str) -> Result<()>;
}
