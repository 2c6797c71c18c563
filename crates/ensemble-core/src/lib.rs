//! Port, buffer and queue model shared by Ensemble's hosted nodes.
//!
//! # Primary API
//!
//! - [`PortList`] / [`PortDescription`]: ordered port registry of a plugin or node
//! - [`ChannelConfig`]: (type, channel, direction) → port index
//! - [`PortBuffer`]: scalar, audio-reference or event-sequence storage for one port
//! - [`event_ring`]: lock-free SPSC queue of tagged port events
//! - [`Parameter`]: uniform automatable value with listeners
//! - [`Node`]: capability interface every graph node implements
//!
//! Everything reachable from a render path is allocation-free after
//! construction and never returns an error.

pub mod error;
pub use error::{Error, Result};

mod port;
pub use port::{PortDescription, PortList, PortType};

mod channel;
pub use channel::ChannelConfig;

mod buffer;
pub use buffer::{EventSequence, PortBuffer, PortData, SequenceEvent, SequenceIter};

mod ring;
pub use ring::{decode_float, event_ring, EventReader, EventWriter, PortEvent, PORT_EVENT_SIZE};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat, ScopedFlag};

mod fade;
pub use fade::{LinearFade, MAX_FADE_SECS, MIN_FADE_SECS};

pub mod parameter;
pub use parameter::{
    ListenerId, Parameter, ParameterChange, ParameterListeners, ParameterRange, ParameterScale,
};

mod node;
pub use node::{AudioBuffer, MidiMessage, MidiPipe, Node, NodePorts};

pub mod uri;
