//! Tolerance constants for audio testing.

/// Floating point rounding errors (for passthrough, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Largest per-sample jump allowed while a patch point is fading.
/// One 1 ms fade step at 48 kHz is 1/48; anything above two steps is a click.
pub const FADE_STEP_EPSILON: f32 = 2.0 / 48.0;

/// Values below this are considered silent (~-80dB).
pub const SILENCE_THRESHOLD: f32 = 0.0001;
