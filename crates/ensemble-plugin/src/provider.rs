//! Contract between the host and a native plugin implementation.
//!
//! A [`PluginProvider`] describes a plugin (metadata, ports, declared
//! extensions, presets) and creates [`NativeInstance`]s. Everything a
//! module knows about a plugin comes through these traits.

use crate::error::Result;
use crate::metadata::PluginMetadata;
use crate::parameter::NativeParameter;
use crate::worker::WorkerSchedule;
use ensemble_core::{ParameterScale, PortData, PortType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Static description of one native port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortInfo {
    pub port_type: PortType,
    pub is_input: bool,
    pub symbol: String,
    pub name: String,
    /// NaN when unspecified.
    pub min: f32,
    /// NaN when unspecified.
    pub max: f32,
    /// NaN when unspecified.
    pub default: f32,
    pub scale: ParameterScale,
    /// Sequence port that accepts MIDI events.
    pub supports_midi: bool,
}

impl PortInfo {
    pub fn new(
        port_type: PortType,
        is_input: bool,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            port_type,
            is_input,
            symbol: symbol.into(),
            name: name.into(),
            min: f32::NAN,
            max: f32::NAN,
            default: f32::NAN,
            scale: ParameterScale::Linear,
            supports_midi: false,
        }
    }

    pub fn audio(symbol: impl Into<String>, name: impl Into<String>, is_input: bool) -> Self {
        Self::new(PortType::Audio, is_input, symbol, name)
    }

    pub fn control(
        symbol: impl Into<String>,
        name: impl Into<String>,
        is_input: bool,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::new(PortType::Control, is_input, symbol, name).with_range(min, max, default)
    }

    /// Atom sequence port accepting MIDI.
    pub fn midi(symbol: impl Into<String>, name: impl Into<String>, is_input: bool) -> Self {
        let mut info = Self::new(PortType::Atom, is_input, symbol, name);
        info.supports_midi = true;
        info
    }

    pub fn with_range(mut self, min: f32, max: f32, default: f32) -> Self {
        self.min = min;
        self.max = max;
        self.default = default;
        self
    }

    pub fn with_scale(mut self, scale: ParameterScale) -> Self {
        self.scale = scale;
        self
    }

    /// `(min, max, default)` with unspecified bounds filled in.
    ///
    /// A missing minimum is 0, a missing maximum is 1, and a missing default
    /// resolves to the minimum.
    pub fn range(&self) -> (f32, f32, f32) {
        let min = if self.min.is_nan() { 0.0 } else { self.min };
        let max = if self.max.is_nan() { 1.0 } else { self.max };
        let default = if self.default.is_nan() { min } else { self.default };
        (min, max, default)
    }
}

/// One saved control value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortValue {
    pub symbol: String,
    pub value: f32,
}

impl PortValue {
    pub fn new(symbol: impl Into<String>, value: f32) -> Self {
        Self {
            symbol: symbol.into(),
            value,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PodState {
    uri: String,
    ports: Vec<PortValue>,
}

/// Features offered to a plugin at instantiation.
pub struct HostFeatures {
    supported: Vec<&'static str>,
    worker: Option<WorkerSchedule>,
}

impl HostFeatures {
    pub fn new(supported: &[&'static str]) -> Self {
        Self {
            supported: supported.to_vec(),
            worker: None,
        }
    }

    pub(crate) fn offer_worker(&mut self, schedule: WorkerSchedule) {
        self.supported.push(ensemble_core::uri::WORKER_SCHEDULE);
        self.worker = Some(schedule);
    }

    pub fn supports(&self, uri: &str) -> bool {
        self.supported.iter().any(|feature| *feature == uri)
    }

    pub fn uris(&self) -> &[&'static str] {
        &self.supported
    }

    /// Take the worker scheduling handle, if one was offered.
    pub fn take_worker(&mut self) -> Option<WorkerSchedule> {
        self.worker.take()
    }
}

/// Worker entry points exposed by a plugin.
pub trait WorkerInterface: Send + Sync {
    /// Worker thread. `respond` returns false when the response queue is full.
    fn work(&self, request: &[u8], respond: &mut dyn FnMut(&[u8]) -> bool);

    /// Real-time thread, before the next `run`.
    fn work_response(&self, response: &[u8]);

    /// Real-time thread, after every `run`.
    fn end_run(&self) {}
}

/// Result of an extension-data query.
#[derive(Clone)]
pub enum ExtensionData {
    Worker(Arc<dyn WorkerInterface>),
    Parameters(Vec<Arc<dyn NativeParameter>>),
}

/// A live plugin instance. Dropping it frees the instance.
pub trait NativeInstance: Send {
    fn activate(&mut self) {}

    fn deactivate(&mut self) {}

    /// Bind a port to host memory. Valid until the next call for the same port.
    fn connect_port(&mut self, port: u32, data: PortData);

    fn run(&mut self, frames: u32);

    fn extension_data(&self, _uri: &str) -> Option<ExtensionData> {
        None
    }
}

/// Describes a plugin and creates instances of it.
pub trait PluginProvider: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    fn ports(&self) -> &[PortInfo];

    /// Whether the plugin declares the given extension in its description.
    fn has_extension(&self, _uri: &str) -> bool {
        false
    }

    /// `None` when the native library refuses to instantiate.
    fn instantiate(
        &self,
        sample_rate: f64,
        features: HostFeatures,
    ) -> Option<Box<dyn NativeInstance>>;

    /// Preset applied right after instantiation.
    fn default_state(&self) -> Option<Vec<PortValue>> {
        None
    }

    /// Encode control values as a state string.
    fn save_state(&self, values: &[PortValue]) -> Result<String> {
        let state = PodState {
            uri: self.metadata().uri.clone(),
            ports: values.to_vec(),
        };
        Ok(serde_json::to_string(&state)?)
    }

    /// Decode a state string produced by [`save_state`](Self::save_state).
    fn restore_state(&self, state: &str) -> Result<Vec<PortValue>> {
        let state: PodState = serde_json::from_str(state)?;
        Ok(state.ports)
    }
}
