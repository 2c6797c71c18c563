//! Graph node wrapping a hosted plugin [`Module`].

use crate::handle::ModuleHandle;
use crate::module::Module;
use crate::parameter::{NativeParameterBridge, PortParameter};
use crate::provider::ExtensionData;
use ensemble_core::uri::{MIDI_EVENT_TYPE, PARAMETERS};
use ensemble_core::{
    AudioBuffer, ChannelConfig, Error, MidiMessage, MidiPipe, Node, NodePorts, Parameter,
    PortBuffer, PortList, PortType, Result,
};
use std::sync::Arc;

pub struct PluginNode {
    module: Module,
    ports: NodePorts,
    handle: ModuleHandle,
    parameters: Vec<Arc<dyn Parameter>>,
    midi_in: Option<u32>,
    midi_out: Option<u32>,
    /// Stands in for channels the host buffer does not have.
    scratch: AudioBuffer,
    max_block_size: usize,
}

impl PluginNode {
    pub fn new(module: Module) -> Self {
        let handle = module.handle();
        let mut node = Self {
            module,
            ports: NodePorts::default(),
            handle,
            parameters: Vec::new(),
            midi_in: None,
            midi_out: None,
            scratch: AudioBuffer::default(),
            max_block_size: 0,
        };
        node.refresh_ports();
        node
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn handle(&self) -> ModuleHandle {
        self.handle.clone()
    }

    /// Port parameters first, then any native parameters.
    pub fn parameters(&self) -> &[Arc<dyn Parameter>] {
        &self.parameters
    }

    pub fn parameter_for_port(&self, port: u32) -> Option<&Arc<dyn Parameter>> {
        self.parameters
            .iter()
            .find(|param| param.port_index() == Some(port))
    }

    fn rebuild_parameters(&mut self) {
        let writer = Arc::clone(self.handle.writer());
        let port_parameters: Vec<Arc<PortParameter>> = self
            .module
            .ports()
            .iter()
            .filter(|port| port.port_type == PortType::Control && port.is_input)
            .filter_map(|port| {
                let range = self.module.port_range(port.index)?;
                let initial = self.module.port_value(port.index).unwrap_or(range.default);
                Some(Arc::new(PortParameter::new(
                    port.clone(),
                    range,
                    initial,
                    Arc::clone(&writer),
                )))
            })
            .collect();

        self.handle.set_parameters(port_parameters.clone());

        let mut parameters: Vec<Arc<dyn Parameter>> = port_parameters
            .into_iter()
            .map(|param| param as Arc<dyn Parameter>)
            .collect();
        if let Some(ExtensionData::Parameters(natives)) = self.module.extension_data(PARAMETERS) {
            parameters.extend(
                natives
                    .into_iter()
                    .map(|native| NativeParameterBridge::new(native) as Arc<dyn Parameter>),
            );
        }
        self.parameters = parameters;
    }

    fn bind_audio(&mut self, audio: &mut AudioBuffer) {
        let channels = Arc::clone(self.module.channels());
        for (is_input, count) in [
            (true, channels.num_audio_inputs()),
            (false, channels.num_audio_outputs()),
        ] {
            for channel in 0..count {
                let data = if channel < audio.num_channels() {
                    audio.channel_ptr(channel)
                } else if channel < self.scratch.num_channels() {
                    if is_input {
                        self.scratch.clear_channel(channel);
                    }
                    self.scratch.channel_ptr(channel)
                } else {
                    std::ptr::null_mut()
                };
                self.module
                    .connect_channel(PortType::Audio, channel as u32, is_input, data);
            }
        }
    }

    fn write_midi_input(&mut self, midi: &MidiPipe) {
        let Some(port) = self.midi_in else {
            return;
        };
        let Some(sequence) = self
            .module
            .port_buffer_mut(port)
            .and_then(PortBuffer::sequence_mut)
        else {
            return;
        };
        sequence.reset();
        for message in midi.iter() {
            if !sequence.push(message.frame, MIDI_EVENT_TYPE, message.bytes()) {
                break;
            }
        }
    }

    fn read_midi_output(&self, midi: &mut MidiPipe) {
        midi.clear();
        let Some(sequence) = self
            .midi_out
            .and_then(|port| self.module.port_buffer(port))
            .and_then(PortBuffer::sequence)
        else {
            return;
        };
        for event in sequence.iter() {
            if event.type_tag != MIDI_EVENT_TYPE {
                continue;
            }
            if let Some(message) = MidiMessage::new(event.frame, event.data) {
                midi.push(message);
            }
        }
    }
}

impl Node for PluginNode {
    fn name(&self) -> &str {
        self.module.name()
    }

    fn refresh_ports(&mut self) {
        self.ports.set(self.module.ports().clone());
        self.midi_in = self.module.midi_port();
        self.midi_out = self.module.notify_port();
        self.rebuild_parameters();
    }

    fn ports(&self) -> &PortList {
        self.ports.ports()
    }

    fn channels(&self) -> &Arc<ChannelConfig> {
        self.ports.channels()
    }

    fn prepare_to_render(&mut self, sample_rate: f64, max_block_size: usize) {
        let reloaded = !self.module.is_loaded() || self.module.sample_rate() != sample_rate;
        let result = if self.module.is_loaded() {
            self.module.set_sample_rate(sample_rate)
        } else {
            self.module.instantiate(sample_rate)
        };

        match result {
            Ok(()) => self.module.activate(),
            Err(err) => {
                tracing::warn!(plugin = %self.module.name(), %err, "plugin not prepared");
            }
        }
        if reloaded {
            self.rebuild_parameters();
        }

        let channels = self.module.channels();
        let scratch_channels = channels.num_audio_inputs().max(channels.num_audio_outputs());
        self.scratch.set_size(scratch_channels, max_block_size);
        self.max_block_size = max_block_size;
    }

    fn release_resources(&mut self) {
        self.module.deactivate();
    }

    fn render(&mut self, audio: &mut AudioBuffer, midi: &mut MidiPipe) {
        if !self.module.is_active() {
            audio.clear();
            midi.clear();
            return;
        }

        let frames = audio.num_samples().min(self.max_block_size);
        self.bind_audio(audio);
        self.write_midi_input(midi);
        self.module.run(frames as u32);
        self.read_midi_output(midi);
    }

    fn get_state(&self) -> Result<Vec<u8>> {
        Ok(self.module.get_state_string()?.into_bytes())
    }

    fn set_state(&mut self, data: &[u8]) -> Result<()> {
        let state = std::str::from_utf8(data).map_err(|err| Error::State(err.to_string()))?;
        self.module.set_state_string(state)?;
        Ok(())
    }
}
