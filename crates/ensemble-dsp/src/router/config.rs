//! Router configuration.

use ensemble_core::{Error, Result, MAX_FADE_SECS, MIN_FADE_SECS};

/// Largest supported number of sources or destinations.
pub const MAX_ROUTER_CHANNELS: usize = 128;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub sources: usize,
    pub destinations: usize,
    /// Crossfade applied when a patch point toggles.
    pub fade_length_secs: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            sources: 4,
            destinations: 4,
            fade_length_secs: MIN_FADE_SECS,
        }
    }
}

impl RouterConfig {
    pub fn new(sources: usize, destinations: usize) -> Self {
        Self {
            sources,
            destinations,
            ..Default::default()
        }
    }

    pub fn fade_length(mut self, seconds: f64) -> Self {
        self.fade_length_secs = seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_size(self.sources, self.destinations)?;
        if !(MIN_FADE_SECS..=MAX_FADE_SECS).contains(&self.fade_length_secs) {
            return Err(Error::InvalidConfig(format!(
                "fade length {} s outside [{}, {}]",
                self.fade_length_secs, MIN_FADE_SECS, MAX_FADE_SECS
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_size(sources: usize, destinations: usize) -> Result<()> {
    let valid = 1..=MAX_ROUTER_CHANNELS;
    if !valid.contains(&sources) || !valid.contains(&destinations) {
        return Err(Error::InvalidConfig(format!(
            "router size {}x{} outside 1..={}",
            sources, destinations, MAX_ROUTER_CHANNELS
        )));
    }
    Ok(())
}
