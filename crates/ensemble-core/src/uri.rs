//! Feature/extension identifiers and fixed protocol tags.

/// Host feature: schedule non-real-time work.
pub const WORKER_SCHEDULE: &str = "http://lv2plug.in/ns/ext/worker#schedule";

/// Plugin extension: worker interface.
pub const WORKER_INTERFACE: &str = "http://lv2plug.in/ns/ext/worker#interface";

/// Host feature: URI → integer mapping.
pub const URID_MAP: &str = "http://lv2plug.in/ns/ext/urid#map";

/// Host feature: integer → URI mapping.
pub const URID_UNMAP: &str = "http://lv2plug.in/ns/ext/urid#unmap";

/// Host feature: fixed/bounded block length.
pub const BOUNDED_BLOCK_LENGTH: &str = "http://lv2plug.in/ns/ext/buf-size#boundedBlockLength";

/// Plugin extension: native parameter objects.
pub const PARAMETERS: &str = "urn:ensemble:ext:parameters";

/// Event payload type: raw MIDI.
pub const MIDI_EVENT: &str = "http://lv2plug.in/ns/ext/midi#MidiEvent";

/// Ring protocol for a single little-endian `f32` written to a control port.
pub const FLOAT_PROTOCOL: u32 = 0;

/// Sequence type tag for raw MIDI bytes.
pub const MIDI_EVENT_TYPE: u32 = 1;

/// Features every module is offered at instantiation.
pub const DEFAULT_FEATURES: &[&str] = &[URID_MAP, URID_UNMAP, BOUNDED_BLOCK_LENGTH];
