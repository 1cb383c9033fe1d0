//! Tolerance constants for audio testing.

/// Rounding error of exact operations (passthrough, unity gain, summing).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Gain ramps and other smoothed processing.
pub const DSP_EPSILON: f32 = 1e-4;

/// Values below this (~-80 dB) count as silence.
pub const SILENCE_THRESHOLD: f32 = 0.0001;
