//! Vibration adapter
//!
//! Desktop platforms expose no vibration hardware, so the default device
//! reports unsupported and every call is a no-op. Mobile shells provide
//! their own `VibrationDevice` implementation at composition time.

use repforge_core::alerts::VibrationDevice;
use repforge_domain::Result;

/// Vibration device for platforms without vibration hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedVibration;

impl VibrationDevice for UnsupportedVibration {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&self, _pattern: &[u64]) -> Result<()> {
        Ok(())
    }
}
