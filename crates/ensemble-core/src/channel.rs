//! (type, channel, direction) → port index map.
//!
//! Derived from a [`PortList`] in one pass and never patched afterwards. When
//! ports are rebuilt a new config replaces the old one; indices looked up from
//! an older config must not be used against the new port list.

use crate::port::{PortList, PortType};

const NUM_TYPES: usize = 7;

#[inline]
fn slot(port_type: PortType, is_input: bool) -> usize {
    let t = match port_type {
        PortType::Audio => 0,
        PortType::Control => 1,
        PortType::Cv => 2,
        PortType::Atom => 3,
        PortType::Event => 4,
        PortType::Midi => 5,
        PortType::Unknown => 6,
    };
    t * 2 + usize::from(is_input)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    channels: [Vec<u32>; NUM_TYPES * 2],
}

impl ChannelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ports(ports: &PortList) -> Self {
        let mut config = Self::new();
        for port in ports {
            config.add_port(port.port_type, port.index, port.is_input);
        }
        config
    }

    /// Next channel of this type/direction maps to `index`.
    fn add_port(&mut self, port_type: PortType, index: u32, is_input: bool) {
        self.channels[slot(port_type, is_input)].push(index);
    }

    /// Port index for a channel, or `None` if the channel does not exist.
    #[inline]
    pub fn port(&self, port_type: PortType, channel: u32, is_input: bool) -> Option<u32> {
        self.channels[slot(port_type, is_input)]
            .get(channel as usize)
            .copied()
    }

    #[inline]
    pub fn num_channels(&self, port_type: PortType, is_input: bool) -> usize {
        self.channels[slot(port_type, is_input)].len()
    }

    pub fn num_audio_inputs(&self) -> usize {
        self.num_channels(PortType::Audio, true)
    }

    pub fn num_audio_outputs(&self) -> usize {
        self.num_channels(PortType::Audio, false)
    }

    pub fn num_control_inputs(&self) -> usize {
        self.num_channels(PortType::Control, true)
    }

    pub fn num_control_outputs(&self) -> usize {
        self.num_channels(PortType::Control, false)
    }

    pub fn num_cv_inputs(&self) -> usize {
        self.num_channels(PortType::Cv, true)
    }

    pub fn num_cv_outputs(&self) -> usize {
        self.num_channels(PortType::Cv, false)
    }

    /// Port indices of one type/direction, in channel order.
    pub fn ports_of(&self, port_type: PortType, is_input: bool) -> &[u32] {
        &self.channels[slot(port_type, is_input)]
    }
}
