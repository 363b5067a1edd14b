//! Tone pattern synthesis
//!
//! Pure sample math: each [`ToneKind`] maps to a fixed short pattern of
//! sine bursts rendered as mono f32 PCM. Playback happens elsewhere; this
//! module has no side effects.

use std::f32::consts::TAU;

use repforge_domain::ToneKind;

/// Sample rate for all synthesized tones
pub const SAMPLE_RATE: u32 = 44_100;

const ATTACK_MS: u64 = 8;
const RELEASE_MS: u64 = 30;

/// A single sine burst followed by a gap of silence
struct Burst {
    freq_hz: f32,
    duration_ms: u64,
    gap_ms: u64,
}

/// Multi-burst rising-pitch alarm: two rising three-note sweeps.
const ALARM_BURSTS: &[Burst] = &[
    Burst { freq_hz: 740.0, duration_ms: 140, gap_ms: 60 },
    Burst { freq_hz: 880.0, duration_ms: 140, gap_ms: 60 },
    Burst { freq_hz: 1046.0, duration_ms: 180, gap_ms: 160 },
    Burst { freq_hz: 740.0, duration_ms: 140, gap_ms: 60 },
    Burst { freq_hz: 880.0, duration_ms: 140, gap_ms: 60 },
    Burst { freq_hz: 1046.0, duration_ms: 220, gap_ms: 0 },
];

/// Simple triple beep at a single pitch.
const BEEP_BURSTS: &[Burst] = &[
    Burst { freq_hz: 1000.0, duration_ms: 120, gap_ms: 90 },
    Burst { freq_hz: 1000.0, duration_ms: 120, gap_ms: 90 },
    Burst { freq_hz: 1000.0, duration_ms: 120, gap_ms: 0 },
];

/// C-major triad used for the bell chord.
const BELL_CHORD_HZ: [f32; 3] = [523.25, 659.25, 783.99];
const BELL_DURATION_MS: u64 = 900;

/// Synthesize the samples for a tone pattern at the given volume.
///
/// Volume is clamped to `0.0..=1.0`. The result is mono f32 PCM at
/// [`SAMPLE_RATE`].
pub fn synthesize(kind: ToneKind, volume: f32) -> Vec<f32> {
    let volume = volume.clamp(0.0, 1.0);

    match kind {
        ToneKind::Alarm => render_bursts(ALARM_BURSTS, volume),
        ToneKind::Beep => render_bursts(BEEP_BURSTS, volume),
        ToneKind::Bell => render_chord(&BELL_CHORD_HZ, BELL_DURATION_MS, volume),
    }
}

fn samples_for_ms(ms: u64) -> usize {
    (u64::from(SAMPLE_RATE) * ms / 1000) as usize
}

fn render_bursts(bursts: &[Burst], volume: f32) -> Vec<f32> {
    let total: usize =
        bursts.iter().map(|b| samples_for_ms(b.duration_ms) + samples_for_ms(b.gap_ms)).sum();
    let mut samples = Vec::with_capacity(total);

    for burst in bursts {
        render_sine(&mut samples, burst.freq_hz, burst.duration_ms, volume);
        samples.extend(std::iter::repeat(0.0).take(samples_for_ms(burst.gap_ms)));
    }

    samples
}

/// Render one sine burst with a short linear attack and release envelope
/// so bursts start and end without clicks.
fn render_sine(out: &mut Vec<f32>, freq_hz: f32, duration_ms: u64, volume: f32) {
    let len = samples_for_ms(duration_ms);
    let attack = samples_for_ms(ATTACK_MS).max(1);
    let release = samples_for_ms(RELEASE_MS).max(1);

    for i in 0..len {
        let t = i as f32 / SAMPLE_RATE as f32;
        let mut envelope = 1.0_f32;
        if i < attack {
            envelope = i as f32 / attack as f32;
        }
        let from_end = len - i;
        if from_end <= release {
            envelope = envelope.min(from_end as f32 / release as f32);
        }
        out.push((t * freq_hz * TAU).sin() * envelope * volume);
    }
}

/// Render a chord with an exponential decay, the soft "bell" sound.
fn render_chord(freqs_hz: &[f32], duration_ms: u64, volume: f32) -> Vec<f32> {
    let len = samples_for_ms(duration_ms);
    let scale = volume / freqs_hz.len() as f32;
    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        let t = i as f32 / SAMPLE_RATE as f32;
        let decay = (-4.0 * t * 1000.0 / duration_ms as f32).exp();
        let value: f32 = freqs_hz.iter().map(|f| (t * f * TAU).sin()).sum();
        samples.push(value * scale * decay);
    }

    samples
}
