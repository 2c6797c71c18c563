//! Click-free linear gain ramps.
//!
//! A [`LinearFade`] moves its gain toward 0 or 1 at a fixed slope of one
//! full swing per fade length. Reversing direction mid-fade continues from
//! the current gain, so toggling back and forth never jumps.
//!
//! ```
//! use ensemble_core::LinearFade;
//!
//! let mut fade = LinearFade::new(0.001, 48000.0);
//! fade.fade_in();
//! let mut block = [1.0f32; 64];
//! fade.apply(&mut block);
//! assert_eq!(block[63], 1.0);
//! ```

/// Shortest allowed fade, in seconds.
pub const MIN_FADE_SECS: f64 = 0.001;
/// Longest allowed fade, in seconds.
pub const MAX_FADE_SECS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct LinearFade {
    gain: f32,
    target: f32,
    delta: f32,
    length_secs: f64,
    sample_rate: f64,
}

impl LinearFade {
    pub fn new(length_secs: f64, sample_rate: f64) -> Self {
        let mut fade = Self {
            gain: 0.0,
            target: 0.0,
            delta: 1.0,
            length_secs: MIN_FADE_SECS,
            sample_rate: sample_rate.max(1.0),
        };
        fade.set_length(length_secs);
        fade
    }

    /// Clamped to [`MIN_FADE_SECS`, `MAX_FADE_SECS`].
    pub fn set_length(&mut self, length_secs: f64) {
        self.length_secs = length_secs.clamp(MIN_FADE_SECS, MAX_FADE_SECS);
        self.update_delta();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_delta();
    }

    fn update_delta(&mut self) {
        let samples = (self.length_secs * self.sample_rate).max(1.0);
        self.delta = (1.0 / samples) as f32;
    }

    #[inline]
    pub fn length_secs(&self) -> f64 {
        self.length_secs
    }

    /// Samples needed for a full 0 → 1 swing.
    #[inline]
    pub fn length_samples(&self) -> usize {
        (self.length_secs * self.sample_rate).max(1.0).round() as usize
    }

    #[inline]
    pub fn fade_in(&mut self) {
        self.target = 1.0;
    }

    #[inline]
    pub fn fade_out(&mut self) {
        self.target = 0.0;
    }

    #[inline]
    pub fn set_target(&mut self, on: bool) {
        self.target = if on { 1.0 } else { 0.0 };
    }

    /// Jump straight to fully on or off.
    #[inline]
    pub fn set_immediate(&mut self, on: bool) {
        self.set_target(on);
        self.gain = self.target;
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.gain != self.target
    }

    /// Fully on and not moving.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.gain == 1.0 && self.target == 1.0
    }

    /// Advance one sample and return the gain to apply to it.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        // Snap within half a step so rounding drift cannot add an extra sample.
        let snap = self.delta * 0.5;
        if self.gain < self.target {
            let next = self.gain + self.delta;
            self.gain = if next >= self.target - snap { self.target } else { next };
        } else if self.gain > self.target {
            let next = self.gain - self.delta;
            self.gain = if next <= self.target + snap { self.target } else { next };
        }
        self.gain
    }

    #[inline]
    pub fn apply(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.next_sample();
        }
    }
}

impl Default for LinearFade {
    fn default() -> Self {
        Self::new(MIN_FADE_SECS, 44100.0)
    }
}
