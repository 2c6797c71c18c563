//! Applied patch grid: one gain ramp per source/destination pair.

use super::matrix::MatrixState;
use ensemble_core::LinearFade;

pub(crate) struct ToggleGrid {
    sources: usize,
    destinations: usize,
    fades: Vec<LinearFade>,
    fade_length_secs: f64,
    sample_rate: f64,
}

impl ToggleGrid {
    pub fn new(sources: usize, destinations: usize, fade_length_secs: f64, sample_rate: f64) -> Self {
        Self {
            sources,
            destinations,
            fades: vec![LinearFade::new(fade_length_secs, sample_rate); sources * destinations],
            fade_length_secs,
            sample_rate,
        }
    }

    #[inline]
    pub fn sources(&self) -> usize {
        self.sources
    }

    #[inline]
    pub fn destinations(&self) -> usize {
        self.destinations
    }

    #[inline]
    fn offset(&self, src: usize, dst: usize) -> Option<usize> {
        (src < self.sources && dst < self.destinations).then_some(src * self.destinations + dst)
    }

    /// Start ramping `(src, dst)` toward on or off.
    pub fn set(&mut self, src: usize, dst: usize, patched: bool) -> bool {
        match self.offset(src, dst) {
            Some(i) => {
                self.fades[i].set_target(patched);
                true
            }
            None => false,
        }
    }

    pub fn is_patched(&self, src: usize, dst: usize) -> bool {
        self.offset(src, dst)
            .is_some_and(|i| self.fades[i].target() == 1.0)
    }

    pub fn cell_mut(&mut self, src: usize, dst: usize) -> Option<&mut LinearFade> {
        let i = self.offset(src, dst)?;
        Some(&mut self.fades[i])
    }

    /// Retarget every cell from `matrix`. Does not allocate.
    pub fn apply(&mut self, matrix: &MatrixState) {
        for src in 0..self.sources {
            for dst in 0..self.destinations {
                let i = src * self.destinations + dst;
                self.fades[i].set_target(matrix.is_connected(src, dst));
            }
        }
    }

    pub fn set_fade_length(&mut self, seconds: f64) {
        self.fade_length_secs = seconds;
        for fade in &mut self.fades {
            fade.set_length(seconds);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for fade in &mut self.fades {
            fade.set_sample_rate(sample_rate);
        }
    }

    /// Reallocates. Surviving cells keep their target, settled.
    pub fn resize(&mut self, sources: usize, destinations: usize) {
        let mut resized = Self::new(sources, destinations, self.fade_length_secs, self.sample_rate);
        for src in 0..sources.min(self.sources) {
            for dst in 0..destinations.min(self.destinations) {
                let on = self.is_patched(src, dst);
                if let Some(cell) = resized.cell_mut(src, dst) {
                    cell.set_immediate(on);
                }
            }
        }
        *self = resized;
    }
}
