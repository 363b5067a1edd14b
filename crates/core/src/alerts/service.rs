//! Alert service - sound and vibration dispatch
//!
//! Thin orchestration over the tone and vibration ports. Respects the
//! injected [`AlertSettings`]; every failure path is logged and swallowed
//! so a missed alert never propagates into the timer flow.

use std::sync::Arc;

use repforge_domain::constants::DEFAULT_VIBRATION_PATTERN;
use repforge_domain::{AlertSettings, ToneKind};
use tracing::{debug, warn};

use super::patterns::{synthesize, SAMPLE_RATE};
use super::ports::{TonePlayer, VibrationDevice};

/// Sound and vibration dispatch with user preferences applied
pub struct AlertService {
    settings: AlertSettings,
    player: Arc<dyn TonePlayer>,
    vibration: Arc<dyn VibrationDevice>,
}

impl AlertService {
    /// Create a new alert service.
    pub fn new(
        settings: AlertSettings,
        player: Arc<dyn TonePlayer>,
        vibration: Arc<dyn VibrationDevice>,
    ) -> Self {
        Self { settings, player, vibration }
    }

    /// The injected user preferences.
    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    /// Synthesize and play a tone pattern.
    ///
    /// Uses the configured pattern when `kind` is `None`. A no-op when
    /// sound is disabled; playback errors are logged, never returned.
    pub fn play_tone(&self, kind: Option<ToneKind>) {
        if !self.settings.sound_enabled {
            debug!("sound disabled, skipping tone");
            return;
        }

        let kind = kind.unwrap_or(self.settings.sound_type);
        let samples = synthesize(kind, self.settings.volume);

        if let Err(err) = self.player.play(&samples, SAMPLE_RATE) {
            warn!(error = %err, ?kind, "tone playback failed");
        }
    }

    /// Issue a device vibration pattern.
    ///
    /// Uses the default pattern when `pattern` is `None`. A no-op when
    /// vibration is disabled or unsupported; errors are logged, never
    /// returned.
    pub fn trigger_vibration(&self, pattern: Option<&[u64]>) {
        if !self.settings.vibration_enabled {
            debug!("vibration disabled, skipping");
            return;
        }
        if !self.vibration.is_supported() {
            debug!("vibration unsupported on this platform");
            return;
        }

        let pattern = pattern.unwrap_or(DEFAULT_VIBRATION_PATTERN);
        if let Err(err) = self.vibration.vibrate(pattern) {
            warn!(error = %err, "vibration failed");
        }
    }
}
