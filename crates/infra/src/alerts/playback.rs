//! Tone playback through a system audio player
//!
//! Renders synthesized samples to a WAV file in the temp directory and
//! hands it to the first available command-line player, detached. The
//! resolved player is cached and re-probed if a spawn fails, since the
//! audio stack can go away mid-session (sound server restart, device
//! unplugged).

use std::path::PathBuf;
use std::process::{Command, Stdio};

use parking_lot::Mutex;
use repforge_core::alerts::TonePlayer;
use repforge_domain::{RepForgeError, Result};
use tracing::debug;

/// Player binaries probed in order
const PLAYER_CANDIDATES: &[&str] = &["paplay", "aplay", "afplay"];

/// Tone player shelling out to the platform audio player
pub struct CommandTonePlayer {
    wav_path: PathBuf,
    cached_player: Mutex<Option<&'static str>>,
}

impl CommandTonePlayer {
    /// Create a player writing its scratch WAV to the temp directory.
    pub fn new() -> Self {
        Self {
            wav_path: std::env::temp_dir().join("repforge-tone.wav"),
            cached_player: Mutex::new(None),
        }
    }

    fn spawn_player(&self, binary: &str) -> std::io::Result<()> {
        Command::new(binary)
            .arg(&self.wav_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

impl Default for CommandTonePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TonePlayer for CommandTonePlayer {
    fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        let wav = encode_wav(samples, sample_rate);
        std::fs::write(&self.wav_path, wav)
            .map_err(|e| RepForgeError::Platform(format!("Failed to write tone file: {e}")))?;

        // Fast path: the player that worked last time
        let cached = *self.cached_player.lock();
        if let Some(binary) = cached {
            if self.spawn_player(binary).is_ok() {
                return Ok(());
            }
            debug!(binary, "cached audio player failed, re-probing");
            *self.cached_player.lock() = None;
        }

        for binary in PLAYER_CANDIDATES {
            if self.spawn_player(binary).is_ok() {
                debug!(binary, "audio player resolved");
                *self.cached_player.lock() = Some(binary);
                return Ok(());
            }
        }

        Err(RepForgeError::Platform("No audio player available".into()))
    }
}

/// Encode mono f32 samples as a 16-bit PCM WAV byte stream.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * 2;
    let mut out = Vec::with_capacity(44 + samples.len() * 2);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes()); // chunk size
    out.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1_u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2_u16.to_le_bytes()); // block align
    out.extend_from_slice(&16_u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }

    out
}
