//! Alert delivery adapters

pub mod notifier;
pub mod playback;
pub mod vibration;

pub use notifier::DesktopNotifier;
pub use playback::CommandTonePlayer;
pub use vibration::UnsupportedVibration;
