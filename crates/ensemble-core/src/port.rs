//! Port descriptors and the ordered port list of a plugin or node.
//!
//! A [`PortList`] is built once from plugin metadata (or from a node's own
//! topology) and replaced wholesale on a port rebuild. Indices are dense
//! `0..N-1` and are supplied in ascending order by whoever builds the list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of data a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    Audio,
    Control,
    Cv,
    Atom,
    Event,
    Midi,
    Unknown,
}

impl PortType {
    /// Types whose buffer is a scalar float.
    #[inline]
    pub fn is_scalar(self) -> bool {
        matches!(self, PortType::Control | PortType::Cv)
    }

    /// Types whose buffer is an event sequence.
    #[inline]
    pub fn is_sequence(self) -> bool {
        matches!(self, PortType::Atom | PortType::Event | PortType::Midi)
    }

    pub fn all() -> &'static [PortType] {
        &[
            PortType::Audio,
            PortType::Control,
            PortType::Cv,
            PortType::Atom,
            PortType::Event,
            PortType::Midi,
            PortType::Unknown,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            PortType::Audio => "audio",
            PortType::Control => "control",
            PortType::Cv => "cv",
            PortType::Atom => "atom",
            PortType::Event => "event",
            PortType::Midi => "midi",
            PortType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of one port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescription {
    pub port_type: PortType,
    /// Position in the owning [`PortList`].
    pub index: u32,
    /// Position among ports of the same type and direction.
    pub channel: u32,
    pub symbol: String,
    pub name: String,
    pub is_input: bool,
}

/// Ordered port registry. Insertion order is discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortList {
    ports: Vec<PortDescription>,
}

impl PortList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ports: Vec::with_capacity(capacity),
        }
    }

    /// Append a port. `index` must equal the current length.
    pub fn add(
        &mut self,
        port_type: PortType,
        index: u32,
        channel: u32,
        symbol: impl Into<String>,
        name: impl Into<String>,
        is_input: bool,
    ) {
        debug_assert_eq!(
            index as usize,
            self.ports.len(),
            "port indices must be dense and ascending"
        );
        self.ports.push(PortDescription {
            port_type,
            index,
            channel,
            symbol: symbol.into(),
            name: name.into(),
            is_input,
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Count of ports matching both type and direction.
    pub fn size(&self, port_type: PortType, is_input: bool) -> usize {
        self.ports
            .iter()
            .filter(|p| p.port_type == port_type && p.is_input == is_input)
            .count()
    }

    /// O(1) lookup by index.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&PortDescription> {
        debug_assert!(
            (index as usize) < self.ports.len(),
            "port index {index} out of range"
        );
        self.ports.get(index as usize)
    }

    /// Linear scan by symbol.
    pub fn find(&self, symbol: &str) -> Option<&PortDescription> {
        self.ports.iter().find(|p| p.symbol == symbol)
    }

    pub fn contains(&self, index: u32) -> bool {
        (index as usize) < self.ports.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PortDescription> {
        self.ports.iter()
    }

    pub fn as_slice(&self) -> &[PortDescription] {
        &self.ports
    }
}

impl<'a> IntoIterator for &'a PortList {
    type Item = &'a PortDescription;
    type IntoIter = std::slice::Iter<'a, PortDescription>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}
