//! Control-thread access to a running module.
//!
//! The audio thread owns the [`Module`](crate::Module). UI and other control
//! code hold a [`ModuleHandle`] instead: it writes port events into the
//! module's inbound ring and drains the outbound notification ring. The
//! handle holds no ownership of the module, so every operation first checks
//! that the module is still alive.

use crate::parameter::PortParameter;
use ensemble_core::uri::FLOAT_PROTOCOL;
use ensemble_core::{decode_float, EventReader, EventWriter, PortEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// Producer side of a module's inbound port event ring.
pub struct PortWriter {
    writer: Mutex<EventWriter>,
    alive: Weak<()>,
}

impl PortWriter {
    pub(crate) fn new(writer: EventWriter, alive: Weak<()>) -> Self {
        Self {
            writer: Mutex::new(writer),
            alive,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }

    /// Queue `payload` for `port`. Returns false if the module is gone or the
    /// ring is full; the event is dropped in both cases.
    pub fn write(&self, port: u32, protocol: u32, payload: &[u8]) -> bool {
        if !self.is_alive() {
            return false;
        }
        if !self.writer.lock().write(port, protocol, payload) {
            tracing::debug!(port, "plugin write buffer full");
            return false;
        }
        true
    }

    pub fn write_control(&self, port: u32, value: f32) -> bool {
        self.write(port, FLOAT_PROTOCOL, &value.to_le_bytes())
    }
}

/// Cloneable non-owning handle to a module.
#[derive(Clone)]
pub struct ModuleHandle {
    writer: Arc<PortWriter>,
    notifications: Arc<Mutex<EventReader>>,
    parameters: Arc<RwLock<Vec<Arc<PortParameter>>>>,
}

impl ModuleHandle {
    pub(crate) fn new(writer: EventWriter, notifications: EventReader, alive: Weak<()>) -> Self {
        Self {
            writer: Arc::new(PortWriter::new(writer, alive)),
            notifications: Arc::new(Mutex::new(notifications)),
            parameters: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.writer.is_alive()
    }

    pub fn writer(&self) -> &Arc<PortWriter> {
        &self.writer
    }

    pub fn write(&self, port: u32, protocol: u32, payload: &[u8]) -> bool {
        self.writer.write(port, protocol, payload)
    }

    pub fn write_control(&self, port: u32, value: f32) -> bool {
        self.writer.write_control(port, value)
    }

    /// Replace the port parameters kept in sync by
    /// [`poll_notifications`](Self::poll_notifications).
    pub fn set_parameters(&self, parameters: Vec<Arc<PortParameter>>) {
        *self.parameters.write() = parameters;
    }

    pub fn parameters(&self) -> Vec<Arc<PortParameter>> {
        self.parameters.read().clone()
    }

    /// Drain pending notifications. Control values update the matching port
    /// parameter before `on_event` sees them. Call from a UI timer.
    pub fn poll_notifications(&self, mut on_event: impl FnMut(PortEvent, &[u8])) -> usize {
        if !self.is_alive() {
            return 0;
        }

        let parameters = self.parameters.read();
        let mut reader = self.notifications.lock();
        reader.drain(|event, payload| {
            if event.protocol == FLOAT_PROTOCOL {
                if let Some(value) = decode_float(payload) {
                    for parameter in parameters.iter().filter(|p| p.port() == event.index) {
                        parameter.port_value_changed(value);
                    }
                }
            }
            on_event(event, payload);
        })
    }
}
