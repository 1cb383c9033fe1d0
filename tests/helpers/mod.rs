//! Test helpers and fixtures for ensemble integration tests.
//!
//! Every engine here renders offline through `render_offline`; nothing needs
//! an audio device.

#![allow(dead_code)]

pub mod tolerances;

use ensemble::prelude::*;
use std::sync::Arc;

pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Small blocks so a few hundred frames exercise chunking.
pub const TEST_BLOCK_SIZE: usize = 64;

pub const MASTER: TrackId = TrackId(1);

/// Engine at the test format with the built-in plugins.
pub fn test_engine() -> EnsembleEngine {
    init_tracing();
    EnsembleEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .block_size(TEST_BLOCK_SIZE)
        .build()
        .expect("Failed to create test engine")
}

/// Route `RUST_LOG`-filtered tracing output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A mono clip of `value` starting at frame 0, long enough for any test.
pub fn constant_clip(value: f32) -> Clip {
    Clip::new(0, Arc::new(MemorySource::constant(1, 1 << 20, value)))
}

/// Add a stereo master aux and make it the edit's master.
pub fn add_master(edit: &mut Edit) {
    edit.add_track(Track::aux(MASTER, "master"))
        .expect("master track");
    edit.set_master(MASTER).expect("set master");
}

/// Add an audio track playing `value`, routed to the master.
pub fn add_constant_track(edit: &mut Edit, id: u64, value: f32) -> TrackId {
    edit.add_track(
        Track::audio(TrackId::new(id), format!("track {id}"))
            .with_output(MASTER)
            .with_clip(constant_clip(value)),
    )
    .expect("audio track")
}

/// One channel of an interleaved buffer.
pub fn channel(interleaved: &[f32], channels: usize, channel: usize) -> Vec<f32> {
    interleaved
        .iter()
        .skip(channel)
        .step_by(channels)
        .copied()
        .collect()
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

pub fn is_silent(samples: &[f32]) -> bool {
    peak(samples) < tolerances::SILENCE_THRESHOLD
}

/// Every sample within `epsilon` of `expected`.
pub fn all_near(samples: &[f32], expected: f32, epsilon: f32) -> bool {
    samples.iter().all(|s| (s - expected).abs() <= epsilon)
}
