//! Module configuration.

use ensemble_core::{Error, PORT_EVENT_SIZE};
use std::time::Duration;

/// Sizes of the per-module queues and the UI notification rate.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Bytes in each of the inbound/outbound port event rings.
    pub ring_buffer_size: usize,
    /// Capacity of each Atom/Event/MIDI port sequence.
    pub event_buffer_size: usize,
    /// Bytes in each worker request/response ring.
    pub worker_queue_size: usize,
    /// How often the UI should poll notifications.
    pub notify_rate_hz: u32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: 8192,
            event_buffer_size: 8192,
            worker_queue_size: 2048,
            notify_rate_hz: 60,
        }
    }
}

impl ModuleConfig {
    pub fn validate(&self) -> ensemble_core::Result<()> {
        let min_ring = PORT_EVENT_SIZE + std::mem::size_of::<f32>();
        if self.ring_buffer_size < min_ring {
            return Err(Error::InvalidConfig(format!(
                "ring_buffer_size {} smaller than one control event ({} bytes)",
                self.ring_buffer_size, min_ring
            )));
        }
        if self.worker_queue_size <= PORT_EVENT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "worker_queue_size {} cannot hold a request",
                self.worker_queue_size
            )));
        }
        if self.event_buffer_size == 0 {
            return Err(Error::InvalidConfig("event_buffer_size must be > 0".into()));
        }
        if !(1..=240).contains(&self.notify_rate_hz) {
            return Err(Error::InvalidConfig(format!(
                "notify_rate_hz {} out of range (1-240)",
                self.notify_rate_hz
            )));
        }
        Ok(())
    }

    /// Timer period for polling notifications.
    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.notify_rate_hz.max(1) as f64)
    }
}
