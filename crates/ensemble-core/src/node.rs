//! Graph node capability interface and per-block audio/MIDI containers.

use crate::channel::ChannelConfig;
use crate::port::PortList;
use crate::Result;
use smallvec::SmallVec;
use std::sync::Arc;

/// Channel-major block of audio. Channels are allocated up front.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
            num_samples,
        }
    }

    /// Build from channel data. All channels are truncated to the shortest.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        let num_samples = channels.iter().map(Vec::len).min().unwrap_or(0);
        let channels = channels
            .into_iter()
            .map(|mut ch| {
                ch.truncate(num_samples);
                ch
            })
            .collect();
        Self {
            channels,
            num_samples,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Reallocates. Not for the render path.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for ch in &mut self.channels {
            ch.resize(num_samples, 0.0);
        }
        self.num_samples = num_samples;
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index][..self.num_samples]
    }

    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index][..self.num_samples]
    }

    /// Raw write pointer for binding to a native port.
    #[inline]
    pub fn channel_ptr(&mut self, index: usize) -> *mut f32 {
        self.channels[index].as_mut_ptr()
    }

    pub fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.fill(0.0);
        }
    }

    pub fn clear_channel(&mut self, index: usize) {
        if let Some(ch) = self.channels.get_mut(index) {
            ch.fill(0.0);
        }
    }
}

/// Short MIDI message stamped with a frame offset inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    pub frame: u32,
    pub data: [u8; 3],
    pub len: u8,
}

impl MidiMessage {
    /// `None` for empty or longer-than-three-byte messages.
    pub fn new(frame: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > 3 {
            return None;
        }
        let mut data = [0u8; 3];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            frame,
            data,
            len: bytes.len() as u8,
        })
    }

    pub fn program_change(frame: u32, channel: u8, program: u8) -> Self {
        Self {
            frame,
            data: [0xC0 | (channel & 0x0F), program & 0x7F, 0],
            len: 2,
        }
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    #[inline]
    pub fn is_program_change(&self) -> bool {
        self.len >= 2 && self.data[0] & 0xF0 == 0xC0
    }

    /// Program number for program-change messages.
    #[inline]
    pub fn program(&self) -> Option<u8> {
        self.is_program_change().then_some(self.data[1])
    }
}

/// MIDI passed alongside audio through `render`.
#[derive(Debug, Clone, Default)]
pub struct MidiPipe {
    messages: SmallVec<[MidiMessage; 32]>,
}

impl MidiPipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: MidiMessage) {
        self.messages.push(message);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MidiMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// A node's port list and the channel map derived from it.
///
/// Replacing the ports replaces the map; the old `Arc` held by a consumer
/// keeps describing the old topology.
#[derive(Debug, Clone, Default)]
pub struct NodePorts {
    ports: PortList,
    channels: Arc<ChannelConfig>,
}

impl NodePorts {
    pub fn new(ports: PortList) -> Self {
        let channels = Arc::new(ChannelConfig::from_ports(&ports));
        Self { ports, channels }
    }

    pub fn set(&mut self, ports: PortList) {
        *self = Self::new(ports);
    }

    #[inline]
    pub fn ports(&self) -> &PortList {
        &self.ports
    }

    #[inline]
    pub fn channels(&self) -> &Arc<ChannelConfig> {
        &self.channels
    }
}

/// Capability interface every graph node implements.
pub trait Node: Send {
    fn name(&self) -> &str;

    /// Rebuild the port list and channel map from current node state.
    /// Never called from the render path.
    fn refresh_ports(&mut self);

    fn ports(&self) -> &PortList;

    fn channels(&self) -> &Arc<ChannelConfig>;

    fn prepare_to_render(&mut self, sample_rate: f64, max_block_size: usize);

    fn release_resources(&mut self) {}

    /// Real-time entry point. Must not block, allocate or fail.
    fn render(&mut self, audio: &mut AudioBuffer, midi: &mut MidiPipe);

    fn get_state(&self) -> Result<Vec<u8>>;

    fn set_state(&mut self, data: &[u8]) -> Result<()>;
}
