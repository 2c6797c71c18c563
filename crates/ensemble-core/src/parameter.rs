//! Uniform automatable parameter surface.
//!
//! Values crossing the [`Parameter`] trait are normalized to 0.0-1.0;
//! [`ParameterRange`] converts to and from the real port value.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// How a parameter value is scaled between normalized (0-1) and real values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParameterScale {
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`, requires `min > 0`.
    Logarithmic,

    /// normalized < 0.5 is `min`, otherwise `max`.
    Toggle,

    /// Quantized to integers between `min` and `max`.
    Integer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    pub fn new(min: f32, max: f32, default: f32, scale: ParameterScale) -> Self {
        let default = if default.is_nan() { min } else { default };
        Self {
            min,
            max,
            default: if max > min { default.clamp(min, max) } else { min },
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Linear)
    }

    pub fn toggle(default_on: bool) -> Self {
        Self::new(0.0, 1.0, if default_on { 1.0 } else { 0.0 }, ParameterScale::Toggle)
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Real value → 0..1.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.span();
        if range <= 0.0 {
            return 0.0;
        }
        let value = value.clamp(self.min, self.max);

        match self.scale {
            ParameterScale::Linear => (value - self.min) / range,
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (value.ln() - log_min) / (self.max.ln() - log_min)
            }
            ParameterScale::Logarithmic => (value - self.min) / range,
            ParameterScale::Toggle => {
                if value >= (self.min + self.max) / 2.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ParameterScale::Integer => (value.round() - self.min) / range,
        }
    }

    /// 0..1 → real value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        let range = self.span();

        match self.scale {
            ParameterScale::Linear => self.min + normalized * range,
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (log_min + normalized * (self.max.ln() - log_min)).exp()
            }
            ParameterScale::Logarithmic => self.min + normalized * range,
            ParameterScale::Toggle => {
                if normalized >= 0.5 {
                    self.max
                } else {
                    self.min
                }
            }
            ParameterScale::Integer => (self.min + normalized * range).round(),
        }
    }

    #[inline]
    pub fn default_normalized(&self) -> f32 {
        self.normalize(self.default)
    }

    /// Discrete step count, 0 for continuous ranges.
    pub fn num_steps(&self) -> u32 {
        match self.scale {
            ParameterScale::Toggle => 2,
            ParameterScale::Integer => self.span().max(0.0) as u32 + 1,
            _ => 0,
        }
    }
}

impl Default for ParameterRange {
    fn default() -> Self {
        Self::linear(0.0, 1.0, 0.5)
    }
}

/// Notification carried to parameter listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterChange {
    /// New normalized value.
    Value(f32),
    /// Gesture began (`true`) or ended (`false`).
    Gesture(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(ParameterChange) + Send + Sync>;

/// Listener list shared by every [`Parameter`] implementation.
///
/// Listeners run on the notifying thread while the list is read-locked, so
/// they must not add or remove listeners on the same parameter.
#[derive(Default)]
pub struct ParameterListeners {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ParameterListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: impl Fn(ParameterChange) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Box::new(listener)));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn notify(&self, change: ParameterChange) {
        for (_, listener) in self.listeners.read().iter() {
            listener(change);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Automatable value exposed by a node.
pub trait Parameter: Send + Sync {
    fn name(&self) -> &str;

    fn label(&self) -> &str {
        ""
    }

    /// Port this parameter drives, if any.
    fn port_index(&self) -> Option<u32> {
        None
    }

    /// Normalized 0..1.
    fn value(&self) -> f32;

    /// Normalized 0..1.
    fn set_value(&self, value: f32);

    /// Set and notify every listener.
    fn set_value_notifying_host(&self, value: f32) {
        self.set_value(value);
        self.listeners().notify(ParameterChange::Value(value));
    }

    /// Normalized 0..1.
    fn default_value(&self) -> f32;

    fn text(&self, value: f32) -> String;

    fn value_for_text(&self, text: &str) -> f32;

    fn num_steps(&self) -> u32 {
        0
    }

    fn is_discrete(&self) -> bool {
        self.num_steps() > 0
    }

    fn is_boolean(&self) -> bool {
        false
    }

    fn is_automatable(&self) -> bool {
        true
    }

    fn listeners(&self) -> &ParameterListeners;

    fn add_listener(
        &self,
        listener: Box<dyn Fn(ParameterChange) + Send + Sync>,
    ) -> ListenerId {
        self.listeners().add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners().remove(id)
    }

    fn begin_gesture(&self) {
        self.listeners().notify(ParameterChange::Gesture(true));
    }

    fn end_gesture(&self) {
        self.listeners().notify(ParameterChange::Gesture(false));
    }

    fn current_text(&self) -> String {
        self.text(self.value())
    }
}
