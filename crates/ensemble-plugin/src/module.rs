//! A single hosted plugin: ports, buffers, lifecycle and the per-block run.
//!
//! # Lifecycle
//!
//! ```text
//! Uninstantiated --instantiate--> Instantiated --activate--> Active
//!        ^                             ^   |                   |
//!        |                             |   free            deactivate
//!   failed instantiate                 |   v                   v
//!                                      +-- Freed <--free-- Deactivated
//! ```
//!
//! `instantiate` is idempotent: it frees any existing instance first.
//! `run` is a no-op unless an instance exists.
//!
//! # Threads
//!
//! `run` is called from the audio thread and never allocates, blocks or
//! returns an error. Control-side code talks to the module through its
//! [`ModuleHandle`].

use crate::config::ModuleConfig;
use crate::error::{LoadStage, PluginError, Result};
use crate::handle::ModuleHandle;
use crate::metadata::PluginMetadata;
use crate::provider::{ExtensionData, HostFeatures, NativeInstance, PluginProvider, PortValue};
use crate::worker::WorkerBridge;
use ensemble_core::uri::{DEFAULT_FEATURES, FLOAT_PROTOCOL, WORKER_INTERFACE};
use ensemble_core::{
    decode_float, event_ring, ChannelConfig, EventReader, EventWriter, ParameterRange,
    PortBuffer, PortDescription, PortList, PortType,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Uninstantiated,
    Instantiated,
    Active,
    Deactivated,
    Freed,
}

pub struct Module {
    provider: Arc<dyn PluginProvider>,
    config: ModuleConfig,

    instance: Option<Box<dyn NativeInstance>>,
    worker: Option<WorkerBridge>,
    state: ModuleState,
    active: bool,
    sample_rate: f64,

    ports: PortList,
    channels: Arc<ChannelConfig>,
    buffers: Vec<PortBuffer>,
    /// Last notified value of each control output. NaN until first run.
    output_values: Vec<f32>,

    events: EventReader,
    notifications: EventWriter,
    handle: ModuleHandle,
    alive: Arc<()>,
}

impl Module {
    /// Build ports and buffers from the provider description. Does not
    /// instantiate.
    pub fn new(provider: Arc<dyn PluginProvider>, config: ModuleConfig) -> Result<Self> {
        config.validate()?;

        let mut ports = PortList::with_capacity(provider.ports().len());
        let mut buffers = Vec::with_capacity(provider.ports().len());
        let mut next_channel = std::collections::HashMap::new();

        for (index, info) in provider.ports().iter().enumerate() {
            let channel = next_channel
                .entry((info.port_type, info.is_input))
                .or_insert(0u32);
            ports.add(
                info.port_type,
                index as u32,
                *channel,
                info.symbol.clone(),
                info.name.clone(),
                info.is_input,
            );
            *channel += 1;

            let buffer = if info.port_type.is_scalar() {
                let (min, max, default) = info.range();
                PortBuffer::scalar(info.port_type, info.is_input, min, max, default)
            } else {
                PortBuffer::new(info.port_type, info.is_input, config.event_buffer_size)
            };
            buffers.push(buffer);
        }

        let channels = Arc::new(ChannelConfig::from_ports(&ports));
        let output_values = vec![f32::NAN; ports.len()];

        let (inbound_tx, inbound_rx) = event_ring(config.ring_buffer_size);
        let (notify_tx, notify_rx) = event_ring(config.ring_buffer_size);
        let alive = Arc::new(());
        let handle = ModuleHandle::new(inbound_tx, notify_rx, Arc::downgrade(&alive));

        tracing::debug!(
            uri = %provider.metadata().uri,
            ports = ports.len(),
            "module ports initialised"
        );

        Ok(Self {
            provider,
            config,
            instance: None,
            worker: None,
            state: ModuleState::Uninstantiated,
            active: false,
            sample_rate: 0.0,
            ports,
            channels,
            buffers,
            output_values,
            events: inbound_rx,
            notifications: notify_tx,
            handle,
            alive,
        })
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn metadata(&self) -> &PluginMetadata {
        self.provider.metadata()
    }

    pub fn uri(&self) -> &str {
        &self.provider.metadata().uri
    }

    pub fn name(&self) -> &str {
        &self.provider.metadata().name
    }

    pub fn author(&self) -> &str {
        &self.provider.metadata().author
    }

    pub fn class_label(&self) -> &str {
        &self.provider.metadata().class_label
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn handle(&self) -> ModuleHandle {
        self.handle.clone()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create the native instance at `sample_rate`. Frees any existing
    /// instance first. On failure the module is left without an instance
    /// and may be instantiated again.
    pub fn instantiate(&mut self, sample_rate: f64) -> Result<()> {
        self.free_instance();
        self.sample_rate = sample_rate;

        let mut features = HostFeatures::new(DEFAULT_FEATURES);
        let mut worker = None;
        if self.provider.has_extension(WORKER_INTERFACE) {
            let (bridge, schedule) = WorkerBridge::new(self.config.worker_queue_size);
            features.offer_worker(schedule);
            worker = Some(bridge);
        }

        let Some(instance) = self.provider.instantiate(sample_rate, features) else {
            tracing::warn!(uri = %self.uri(), sample_rate, "could not instantiate plugin");
            self.state = ModuleState::Uninstantiated;
            return Err(PluginError::InstantiationFailed {
                uri: self.uri().to_string(),
                sample_rate,
                stage: LoadStage::Instantiation,
            });
        };

        match instance.extension_data(WORKER_INTERFACE) {
            Some(ExtensionData::Worker(interface)) => match worker.as_mut() {
                Some(bridge) => {
                    if let Err(err) = bridge.set_interface(interface) {
                        tracing::warn!(uri = %self.uri(), %err, "could not start worker");
                        self.state = ModuleState::Uninstantiated;
                        return Err(PluginError::InstantiationFailed {
                            uri: self.uri().to_string(),
                            sample_rate,
                            stage: LoadStage::Worker,
                        });
                    }
                }
                None => {
                    tracing::warn!(
                        uri = %self.uri(),
                        "plugin exposes a worker interface without declaring it"
                    );
                    self.state = ModuleState::Uninstantiated;
                    return Err(PluginError::WorkerUnavailable {
                        uri: self.uri().to_string(),
                    });
                }
            },
            _ => worker = None,
        }

        self.instance = Some(instance);
        self.worker = worker;
        self.state = ModuleState::Instantiated;
        self.load_default_state();

        tracing::info!(
            uri = %self.uri(),
            sample_rate,
            worker = self.worker.is_some(),
            "plugin instantiated"
        );
        Ok(())
    }

    pub fn activate(&mut self) {
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        if self.active {
            return;
        }
        instance.activate();
        self.active = true;
        self.state = ModuleState::Active;
    }

    pub fn deactivate(&mut self) {
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        if !self.active {
            return;
        }
        instance.deactivate();
        self.active = false;
        self.state = ModuleState::Deactivated;
    }

    /// Deactivate, stop the worker and drop the instance.
    pub fn free_instance(&mut self) {
        if self.instance.is_none() {
            return;
        }
        self.deactivate();
        self.worker = None;
        self.instance = None;
        self.state = ModuleState::Freed;
        tracing::debug!(uri = %self.uri(), "plugin instance freed");
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.instance.is_some() && self.active
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Re-instantiate at a new rate, restoring the previous active state.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        if self.instance.is_none() {
            self.sample_rate = sample_rate;
            return Ok(());
        }
        if sample_rate == self.sample_rate {
            return Ok(());
        }

        tracing::info!(
            uri = %self.uri(),
            from = self.sample_rate,
            to = sample_rate,
            "plugin sample rate changed"
        );
        let was_active = self.active;
        self.free_instance();
        self.instantiate(sample_rate)?;
        if was_active {
            self.activate();
        }
        Ok(())
    }

    /// Query an extension on the live instance.
    pub fn extension_data(&self, uri: &str) -> Option<ExtensionData> {
        self.instance.as_ref()?.extension_data(uri)
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Process one block. RT-safe.
    ///
    /// 1. apply queued control writes, echoing each change as a notification
    /// 2. clear output sequences
    /// 3. connect every port buffer
    /// 4. deliver worker responses
    /// 5. run the plugin
    /// 6. end-of-run worker hook, wake the worker
    /// 7. report changed control outputs
    pub fn run(&mut self, frames: u32) {
        let Self {
            instance,
            worker,
            buffers,
            output_values,
            events,
            notifications,
            ..
        } = self;
        let Some(instance) = instance.as_mut() else {
            return;
        };

        events.drain(|event, payload| {
            if event.protocol != FLOAT_PROTOCOL {
                return;
            }
            let (Some(value), Some(buffer)) =
                (decode_float(payload), buffers.get_mut(event.index as usize))
            else {
                return;
            };
            if buffer.port_type() != PortType::Control || !buffer.is_input() {
                return;
            }
            if buffer.value() != value {
                buffer.set_value(value);
                notifications.write(event.index, event.protocol, payload);
            }
        });

        for (index, buffer) in buffers.iter_mut().enumerate() {
            if buffer.is_sequence() && !buffer.is_input() {
                buffer.reset();
            }
            instance.connect_port(index as u32, buffer.port_data());
        }

        if let Some(worker) = worker.as_mut() {
            worker.process_work_responses();
        }

        instance.run(frames);

        if let Some(worker) = worker.as_mut() {
            worker.end_run();
        }

        for (index, buffer) in buffers.iter().enumerate() {
            if buffer.port_type() != PortType::Control || buffer.is_input() {
                continue;
            }
            let value = buffer.value();
            if output_values[index] != value
                && notifications.write_float(index as u32, FLOAT_PROTOCOL, value)
            {
                output_values[index] = value;
            }
        }
    }

    /// Point the Audio/CV port at `(port_type, channel, is_input)` to host
    /// memory for the next `run`. Returns false if there is no such port.
    pub fn connect_channel(
        &mut self,
        port_type: PortType,
        channel: u32,
        is_input: bool,
        data: *mut f32,
    ) -> bool {
        let Some(index) = self.channels.port(port_type, channel, is_input) else {
            return false;
        };
        match self.buffers.get_mut(index as usize) {
            Some(buffer) => {
                buffer.refer_to(data);
                true
            }
            None => false,
        }
    }

    /// Queue a value on the inbound ring, as the UI would.
    pub fn write(&self, port: u32, protocol: u32, payload: &[u8]) -> bool {
        self.handle.write(port, protocol, payload)
    }

    // ========================================================================
    // Ports
    // ========================================================================

    pub fn ports(&self) -> &PortList {
        &self.ports
    }

    pub fn channels(&self) -> &Arc<ChannelConfig> {
        &self.channels
    }

    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    pub fn num_ports_of(&self, port_type: PortType, is_input: bool) -> usize {
        self.ports.size(port_type, is_input)
    }

    pub fn port(&self, index: u32) -> Option<&PortDescription> {
        self.ports.get(index)
    }

    pub fn port_index(&self, symbol: &str) -> Option<u32> {
        self.ports.find(symbol).map(|port| port.index)
    }

    pub fn port_type(&self, index: u32) -> PortType {
        self.ports
            .get(index)
            .map_or(PortType::Unknown, |port| port.port_type)
    }

    pub fn is_port_input(&self, index: u32) -> bool {
        self.ports.get(index).is_some_and(|port| port.is_input)
    }

    pub fn is_port_output(&self, index: u32) -> bool {
        self.ports.get(index).is_some_and(|port| !port.is_input)
    }

    /// Range of a port. An unspecified default resolves to the minimum.
    pub fn port_range(&self, index: u32) -> Option<ParameterRange> {
        let info = self.provider.ports().get(index as usize)?;
        let (min, max, default) = info.range();
        Some(ParameterRange::new(min, max, default, info.scale))
    }

    pub fn port_buffer(&self, index: u32) -> Option<&PortBuffer> {
        self.buffers.get(index as usize)
    }

    pub fn port_buffer_mut(&mut self, index: u32) -> Option<&mut PortBuffer> {
        self.buffers.get_mut(index as usize)
    }

    /// Current value of a scalar port.
    pub fn port_value(&self, index: u32) -> Option<f32> {
        let buffer = self.buffers.get(index as usize)?;
        buffer.port_type().is_scalar().then(|| buffer.value())
    }

    /// First sequence input that accepts MIDI.
    pub fn midi_port(&self) -> Option<u32> {
        self.sequence_port(true)
    }

    /// First sequence output that carries MIDI.
    pub fn notify_port(&self) -> Option<u32> {
        self.sequence_port(false)
    }

    fn sequence_port(&self, is_input: bool) -> Option<u32> {
        self.provider
            .ports()
            .iter()
            .position(|info| {
                info.is_input == is_input
                    && info.port_type.is_sequence()
                    && (info.supports_midi || info.port_type == PortType::Midi)
            })
            .map(|index| index as u32)
    }

    // ========================================================================
    // State
    // ========================================================================

    fn control_values(&self) -> Vec<PortValue> {
        self.ports
            .iter()
            .filter(|port| port.port_type == PortType::Control && port.is_input)
            .map(|port| PortValue::new(port.symbol.clone(), self.buffers[port.index as usize].value()))
            .collect()
    }

    fn apply_control_values(&mut self, values: &[PortValue]) {
        for entry in values {
            let Some(port) = self.ports.find(&entry.symbol) else {
                tracing::debug!(symbol = %entry.symbol, "state names unknown port");
                continue;
            };
            if port.port_type != PortType::Control || !port.is_input {
                continue;
            }
            let index = port.index as usize;
            self.buffers[index].set_value(entry.value);
        }
    }

    fn load_default_state(&mut self) {
        if let Some(values) = self.provider.default_state() {
            self.apply_control_values(&values);
            tracing::debug!(uri = %self.uri(), "default state loaded");
        }
    }

    /// Serialize every control input value.
    pub fn get_state_string(&self) -> Result<String> {
        if self.instance.is_none() {
            return Err(PluginError::NotInstantiated);
        }
        self.provider
            .save_state(&self.control_values())
            .map_err(|err| PluginError::StateSaveError(err.to_string()))
    }

    /// Restore control input values, then notify the UI of every control
    /// value.
    pub fn set_state_string(&mut self, state: &str) -> Result<()> {
        if self.instance.is_none() {
            return Err(PluginError::NotInstantiated);
        }
        let values = self
            .provider
            .restore_state(state)
            .map_err(|err| PluginError::StateRestoreError(err.to_string()))?;
        self.apply_control_values(&values);
        self.send_port_events();
        Ok(())
    }

    /// Push the current value of every control port to the notification ring.
    pub fn send_port_events(&mut self) {
        for port in self.ports.iter() {
            if port.port_type != PortType::Control {
                continue;
            }
            let value = self.buffers[port.index as usize].value();
            if !self
                .notifications
                .write_float(port.index, FLOAT_PROTOCOL, value)
            {
                tracing::debug!(port = port.index, "notification buffer full");
                break;
            }
        }
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        self.free_instance();
    }
}
