//! Parameter bridges between host-side [`Parameter`]s and plugin values.
//!
//! Two flavours:
//!
//! - [`PortParameter`] mirrors a control input port. Host edits are written
//!   into the module's inbound ring; plugin-side changes arrive as
//!   notifications polled through the [`ModuleHandle`](crate::ModuleHandle).
//! - [`NativeParameterBridge`] wraps a parameter object the plugin exposes
//!   itself and forwards changes in both directions.
//!
//! Both guard against feedback: while a change is being propagated from one
//! side, changes arriving from the other side are dropped.

use crate::handle::PortWriter;
use ensemble_core::{
    AtomicFlag, AtomicFloat, ListenerId, Parameter, ParameterChange, ParameterListeners,
    ParameterRange, ParameterScale, PortDescription, ScopedFlag,
};
use std::sync::{Arc, Weak};

fn range_text(range: &ParameterRange, real: f32) -> String {
    match range.scale {
        ParameterScale::Toggle => {
            if range.normalize(real) >= 0.5 {
                "On".to_string()
            } else {
                "Off".to_string()
            }
        }
        ParameterScale::Integer => format!("{}", real.round() as i64),
        _ => format!("{:.2}", real),
    }
}

fn range_value_for_text(range: &ParameterRange, text: &str) -> f32 {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" => return 1.0,
        "off" | "false" => return 0.0,
        _ => {}
    }
    match text.parse::<f32>() {
        Ok(real) => range.normalize(real),
        Err(_) => range.default_normalized(),
    }
}

// ============================================================================
// Port parameter
// ============================================================================

/// Host parameter driving one control input port.
pub struct PortParameter {
    port: PortDescription,
    range: ParameterRange,
    /// Real (port-unit) value.
    value: AtomicFloat,
    writer: Arc<PortWriter>,
    listeners: ParameterListeners,
    ignore_changes: AtomicFlag,
}

impl PortParameter {
    pub fn new(
        port: PortDescription,
        range: ParameterRange,
        initial: f32,
        writer: Arc<PortWriter>,
    ) -> Self {
        let initial = if initial.is_nan() { range.default } else { initial };
        Self {
            port,
            range,
            value: AtomicFloat::new(initial),
            writer,
            listeners: ParameterListeners::new(),
            ignore_changes: AtomicFlag::default(),
        }
    }

    pub fn port(&self) -> u32 {
        self.port.index
    }

    pub fn symbol(&self) -> &str {
        &self.port.symbol
    }

    pub fn range(&self) -> &ParameterRange {
        &self.range
    }

    /// Current value in port units.
    pub fn port_value(&self) -> f32 {
        self.value.get()
    }

    /// The plugin reported a new value for this port.
    pub fn port_value_changed(&self, real: f32) {
        let Some(_guard) = ScopedFlag::try_raise(&self.ignore_changes) else {
            return;
        };
        if self.value.swap(real) != real {
            self.listeners
                .notify(ParameterChange::Value(self.range.normalize(real)));
        }
    }
}

impl Parameter for PortParameter {
    fn name(&self) -> &str {
        &self.port.name
    }

    fn port_index(&self) -> Option<u32> {
        Some(self.port.index)
    }

    fn value(&self) -> f32 {
        self.range.normalize(self.value.get())
    }

    fn set_value(&self, value: f32) {
        let real = self.range.denormalize(value);
        self.value.set(real);
        self.writer.write_control(self.port.index, real);
    }

    fn set_value_notifying_host(&self, value: f32) {
        let Some(_guard) = ScopedFlag::try_raise(&self.ignore_changes) else {
            return;
        };
        self.set_value(value);
        self.listeners.notify(ParameterChange::Value(self.value()));
    }

    fn default_value(&self) -> f32 {
        self.range.default_normalized()
    }

    fn text(&self, value: f32) -> String {
        range_text(&self.range, self.range.denormalize(value))
    }

    fn value_for_text(&self, text: &str) -> f32 {
        range_value_for_text(&self.range, text)
    }

    fn num_steps(&self) -> u32 {
        self.range.num_steps()
    }

    fn is_boolean(&self) -> bool {
        self.range.scale == ParameterScale::Toggle
    }

    fn listeners(&self) -> &ParameterListeners {
        &self.listeners
    }
}

// ============================================================================
// Native parameters
// ============================================================================

/// Parameter object implemented by the plugin.
///
/// Values are normalized 0..1. The plugin keeps its own listener list;
/// [`send_change`](Self::send_change) delivers a change to every listener on
/// that list.
pub trait NativeParameter: Send + Sync {
    fn name(&self) -> &str;

    fn label(&self) -> &str {
        ""
    }

    fn value(&self) -> f32;

    fn set_value(&self, value: f32);

    fn default_value(&self) -> f32;

    fn text(&self, value: f32) -> String {
        format!("{:.2}", value)
    }

    fn value_for_text(&self, text: &str) -> f32 {
        text.trim().parse().unwrap_or_else(|_| self.default_value())
    }

    fn num_steps(&self) -> u32 {
        0
    }

    fn is_boolean(&self) -> bool {
        false
    }

    fn is_automatable(&self) -> bool {
        true
    }

    fn add_listener(&self, listener: Box<dyn Fn(ParameterChange) + Send + Sync>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;

    fn send_change(&self, change: ParameterChange);
}

/// Host [`Parameter`] backed by a [`NativeParameter`].
pub struct NativeParameterBridge {
    native: Arc<dyn NativeParameter>,
    listeners: ParameterListeners,
    ignore_changes: AtomicFlag,
    native_listener: ListenerId,
}

impl NativeParameterBridge {
    pub fn new(native: Arc<dyn NativeParameter>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let native_listener = native.add_listener(Box::new(move |change| {
                if let Some(bridge) = weak.upgrade() {
                    bridge.native_changed(change);
                }
            }));
            Self {
                native,
                listeners: ParameterListeners::new(),
                ignore_changes: AtomicFlag::default(),
                native_listener,
            }
        })
    }

    pub fn native(&self) -> &Arc<dyn NativeParameter> {
        &self.native
    }

    fn native_changed(&self, change: ParameterChange) {
        let Some(_guard) = ScopedFlag::try_raise(&self.ignore_changes) else {
            return;
        };
        self.listeners.notify(change);
    }

    fn host_changed(&self, change: ParameterChange) {
        let Some(_guard) = ScopedFlag::try_raise(&self.ignore_changes) else {
            return;
        };
        if let ParameterChange::Value(value) = change {
            self.native.set_value(value);
        }
        self.listeners.notify(change);
        self.native.send_change(change);
    }
}

impl Drop for NativeParameterBridge {
    fn drop(&mut self) {
        self.native.remove_listener(self.native_listener);
    }
}

impl Parameter for NativeParameterBridge {
    fn name(&self) -> &str {
        self.native.name()
    }

    fn label(&self) -> &str {
        self.native.label()
    }

    fn value(&self) -> f32 {
        self.native.value()
    }

    fn set_value(&self, value: f32) {
        self.native.set_value(value);
    }

    fn set_value_notifying_host(&self, value: f32) {
        self.host_changed(ParameterChange::Value(value));
    }

    fn default_value(&self) -> f32 {
        self.native.default_value()
    }

    fn text(&self, value: f32) -> String {
        self.native.text(value)
    }

    fn value_for_text(&self, text: &str) -> f32 {
        self.native.value_for_text(text)
    }

    fn num_steps(&self) -> u32 {
        self.native.num_steps()
    }

    fn is_boolean(&self) -> bool {
        self.native.is_boolean()
    }

    fn is_automatable(&self) -> bool {
        self.native.is_automatable()
    }

    fn listeners(&self) -> &ParameterListeners {
        &self.listeners
    }

    fn begin_gesture(&self) {
        self.host_changed(ParameterChange::Gesture(true));
    }

    fn end_gesture(&self) {
        self.host_changed(ParameterChange::Gesture(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ensemble_core::uri::FLOAT_PROTOCOL;
    use ensemble_core::{decode_float, event_ring, PortType};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gain_port() -> PortDescription {
        PortDescription {
            port_type: PortType::Control,
            index: 2,
            channel: 0,
            symbol: "gain".into(),
            name: "Gain".into(),
            is_input: true,
        }
    }

    #[test]
    fn test_port_parameter_writes_to_ring() {
        let alive = Arc::new(());
        let (tx, mut rx) = event_ring(256);
        let writer = Arc::new(PortWriter::new(tx, Arc::downgrade(&alive)));
        let param = PortParameter::new(
            gain_port(),
            ParameterRange::linear(-12.0, 12.0, 0.0),
            f32::NAN,
            writer,
        );

        assert_relative_eq!(param.value(), 0.5);
        param.set_value(1.0);
        assert_relative_eq!(param.port_value(), 12.0);

        let (event, payload) = rx.read().unwrap();
        assert_eq!(event.index, 2);
        assert_eq!(event.protocol, FLOAT_PROTOCOL);
        assert_eq!(decode_float(payload), Some(12.0));
    }

    #[test]
    fn test_port_parameter_text() {
        let alive = Arc::new(());
        let (tx, _rx) = event_ring(64);
        let writer = Arc::new(PortWriter::new(tx, Arc::downgrade(&alive)));

        let gain = PortParameter::new(
            gain_port(),
            ParameterRange::linear(-12.0, 12.0, 0.0),
            0.0,
            writer.clone(),
        );
        assert_eq!(gain.text(0.5), "0.00");
        assert_relative_eq!(gain.value_for_text("6"), 0.75);
        assert_relative_eq!(gain.value_for_text("junk"), 0.5);

        let bypass = PortParameter::new(gain_port(), ParameterRange::toggle(false), 0.0, writer);
        assert!(bypass.is_boolean());
        assert_eq!(bypass.text(1.0), "On");
        assert_eq!(bypass.text(0.0), "Off");
        assert_relative_eq!(bypass.value_for_text("on"), 1.0);
    }

    #[test]
    fn test_port_value_changed_notifies_once() {
        let alive = Arc::new(());
        let (tx, _rx) = event_ring(64);
        let writer = Arc::new(PortWriter::new(tx, Arc::downgrade(&alive)));
        let param = PortParameter::new(gain_port(), ParameterRange::linear(0.0, 1.0, 0.0), 0.0, writer);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        param.add_listener(Box::new(move |change| sink.lock().push(change)));

        param.port_value_changed(0.25);
        param.port_value_changed(0.25);
        assert_eq!(*seen.lock(), vec![ParameterChange::Value(0.25)]);
    }

    /// Native parameter that notifies its listeners on every `set_value`,
    /// the way many plugins echo host writes.
    #[derive(Default)]
    struct EchoingNative {
        value: AtomicFloat,
        listeners: ParameterListeners,
        sets: AtomicUsize,
    }

    impl NativeParameter for EchoingNative {
        fn name(&self) -> &str {
            "Cutoff"
        }

        fn value(&self) -> f32 {
            self.value.get()
        }

        fn set_value(&self, value: f32) {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.value.set(value);
            self.listeners.notify(ParameterChange::Value(value));
        }

        fn default_value(&self) -> f32 {
            0.5
        }

        fn add_listener(
            &self,
            listener: Box<dyn Fn(ParameterChange) + Send + Sync>,
        ) -> ListenerId {
            self.listeners.add(listener)
        }

        fn remove_listener(&self, id: ListenerId) -> bool {
            self.listeners.remove(id)
        }

        fn send_change(&self, change: ParameterChange) {
            self.listeners.notify(change);
        }
    }

    #[test]
    fn test_native_change_reaches_host_once() {
        let native = Arc::new(EchoingNative::default());
        let bridge = NativeParameterBridge::new(native.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bridge.add_listener(Box::new(move |change| sink.lock().push(change)));

        native.set_value(0.3);
        assert_eq!(*seen.lock(), vec![ParameterChange::Value(0.3)]);
        assert_relative_eq!(bridge.value(), 0.3);
    }

    #[test]
    fn test_host_change_does_not_echo() {
        let native = Arc::new(EchoingNative::default());
        let bridge = NativeParameterBridge::new(native.clone());

        let host_seen = Arc::new(AtomicUsize::new(0));
        let counter = host_seen.clone();
        bridge.add_listener(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        bridge.set_value_notifying_host(0.8);
        assert_eq!(native.sets.load(Ordering::SeqCst), 1);
        assert_relative_eq!(native.value(), 0.8);
        // The native echo is suppressed; only the host-side notification lands.
        assert_eq!(host_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gestures_forwarded() {
        let native = Arc::new(EchoingNative::default());
        let bridge = NativeParameterBridge::new(native.clone());

        let native_seen = Arc::new(Mutex::new(Vec::new()));
        let sink = native_seen.clone();
        native.add_listener(Box::new(move |change| sink.lock().push(change)));

        bridge.begin_gesture();
        bridge.end_gesture();
        assert_eq!(
            *native_seen.lock(),
            vec![ParameterChange::Gesture(true), ParameterChange::Gesture(false)]
        );
    }

    #[test]
    fn test_bridge_drop_unregisters() {
        let native = Arc::new(EchoingNative::default());
        let bridge = NativeParameterBridge::new(native.clone());
        assert_eq!(native.listeners.len(), 1);
        drop(bridge);
        assert_eq!(native.listeners.len(), 0);
    }
}
