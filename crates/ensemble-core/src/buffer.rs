//! Typed storage backing one port for the current block.
//!
//! Exactly one storage kind is active per buffer, chosen by port type at
//! construction:
//!
//! - Control / CV: a scalar float with its range and default.
//! - Audio: a pointer into host-owned sample memory, rebound every block.
//! - Atom / Event / MIDI: a fixed-capacity [`EventSequence`].

use crate::port::PortType;
use std::ptr;

const EVENT_HEADER_SIZE: usize = 12;

/// One event inside an [`EventSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEvent<'a> {
    pub frame: u32,
    pub type_tag: u32,
    pub data: &'a [u8],
}

/// Capacity-bounded, frame-ordered event buffer. Never reallocates.
#[derive(Debug, Clone)]
pub struct EventSequence {
    data: Box<[u8]>,
    len: usize,
}

impl EventSequence {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes in use, headers included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append an event. Returns false (and writes nothing) if it does not fit.
    pub fn push(&mut self, frame: u32, type_tag: u32, payload: &[u8]) -> bool {
        let needed = EVENT_HEADER_SIZE + payload.len();
        if self.capacity() - self.len < needed {
            return false;
        }

        let start = self.len;
        self.data[start..start + 4].copy_from_slice(&frame.to_le_bytes());
        self.data[start + 4..start + 8].copy_from_slice(&type_tag.to_le_bytes());
        self.data[start + 8..start + 12].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        self.data[start + EVENT_HEADER_SIZE..start + needed].copy_from_slice(payload);
        self.len += needed;
        true
    }

    pub fn iter(&self) -> SequenceIter<'_> {
        SequenceIter {
            data: &self.data[..self.len],
            offset: 0,
        }
    }
}

pub struct SequenceIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = SequenceEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.offset..];
        if rest.len() < EVENT_HEADER_SIZE {
            return None;
        }
        let word = |at: usize| u32::from_le_bytes([rest[at], rest[at + 1], rest[at + 2], rest[at + 3]]);
        let frame = word(0);
        let type_tag = word(4);
        let size = word(8) as usize;
        let end = EVENT_HEADER_SIZE + size;
        if rest.len() < end {
            return None;
        }
        self.offset += end;
        Some(SequenceEvent {
            frame,
            type_tag,
            data: &rest[EVENT_HEADER_SIZE..end],
        })
    }
}

/// Memory handed to a native instance for one port.
///
/// Pointers are valid until the owning buffer is rebound, reset or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortData {
    Scalar(*mut f32),
    Audio(*mut f32),
    Sequence(*mut EventSequence),
    Disconnected,
}

#[derive(Debug)]
enum Storage {
    Scalar {
        value: f32,
        min: f32,
        max: f32,
        default: f32,
    },
    Reference(*mut f32),
    Sequence(EventSequence),
    Empty,
}

#[derive(Debug)]
pub struct PortBuffer {
    port_type: PortType,
    is_input: bool,
    storage: Storage,
}

// SAFETY: the audio reference is only dereferenced by the native instance
// during `run`, on the thread that bound it in the same block.
unsafe impl Send for PortBuffer {}

impl PortBuffer {
    /// `capacity` sizes sequence buffers and is ignored for other types.
    pub fn new(port_type: PortType, is_input: bool, capacity: usize) -> Self {
        let storage = match port_type {
            PortType::Control | PortType::Cv => Storage::Scalar {
                value: 0.0,
                min: 0.0,
                max: 1.0,
                default: 0.0,
            },
            PortType::Audio => Storage::Reference(ptr::null_mut()),
            PortType::Atom | PortType::Event | PortType::Midi => {
                Storage::Sequence(EventSequence::new(capacity))
            }
            PortType::Unknown => Storage::Empty,
        };

        Self {
            port_type,
            is_input,
            storage,
        }
    }

    /// Scalar buffer initialised to `default` (NaN resolves to `min`).
    pub fn scalar(port_type: PortType, is_input: bool, min: f32, max: f32, default: f32) -> Self {
        debug_assert!(port_type.is_scalar());
        let default = if default.is_nan() { min } else { default };
        Self {
            port_type,
            is_input,
            storage: Storage::Scalar {
                value: default,
                min,
                max,
                default,
            },
        }
    }

    #[inline]
    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        self.is_input
    }

    #[inline]
    pub fn is_sequence(&self) -> bool {
        matches!(self.storage, Storage::Sequence(_))
    }

    /// Scalar value. Zero for non-scalar buffers.
    #[inline]
    pub fn value(&self) -> f32 {
        match self.storage {
            Storage::Scalar { value, .. } => value,
            _ => 0.0,
        }
    }

    /// No-op for non-scalar buffers.
    #[inline]
    pub fn set_value(&mut self, new_value: f32) {
        if let Storage::Scalar { value, .. } = &mut self.storage {
            *value = new_value;
        }
    }

    /// `(min, max, default)` for scalar buffers.
    pub fn range(&self) -> Option<(f32, f32, f32)> {
        match self.storage {
            Storage::Scalar { min, max, default, .. } => Some((min, max, default)),
            _ => None,
        }
    }

    /// Point an audio buffer at host sample memory for this block.
    #[inline]
    pub fn refer_to(&mut self, samples: *mut f32) {
        if let Storage::Reference(target) = &mut self.storage {
            *target = samples;
        }
    }

    /// Clear a sequence buffer. Called on outputs before every block.
    #[inline]
    pub fn reset(&mut self) {
        if let Storage::Sequence(seq) = &mut self.storage {
            seq.reset();
        }
    }

    pub fn sequence(&self) -> Option<&EventSequence> {
        match &self.storage {
            Storage::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn sequence_mut(&mut self) -> Option<&mut EventSequence> {
        match &mut self.storage {
            Storage::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Address to connect to the native instance.
    #[inline]
    pub fn port_data(&mut self) -> PortData {
        match &mut self.storage {
            Storage::Scalar { value, .. } => PortData::Scalar(value as *mut f32),
            Storage::Reference(target) if !target.is_null() => PortData::Audio(*target),
            Storage::Reference(_) => PortData::Disconnected,
            Storage::Sequence(seq) => PortData::Sequence(seq as *mut EventSequence),
            Storage::Empty => PortData::Disconnected,
        }
    }
}
