//! Single-producer/single-consumer byte queue carrying tagged port events.
//!
//! Each event is a 12-byte [`PortEvent`] header followed by `size` payload
//! bytes. A write that does not fit is rejected whole, so the queue never
//! holds a truncated event. Neither side allocates after construction.

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Header size in bytes.
pub const PORT_EVENT_SIZE: usize = 12;

/// Header preceding every payload in the ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortEvent {
    pub index: u32,
    pub size: u32,
    pub protocol: u32,
}

impl PortEvent {
    pub fn new(index: u32, size: u32, protocol: u32) -> Self {
        Self {
            index,
            size,
            protocol,
        }
    }

    fn to_bytes(self) -> [u8; PORT_EVENT_SIZE] {
        let mut out = [0u8; PORT_EVENT_SIZE];
        out[0..4].copy_from_slice(&self.index.to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out[8..12].copy_from_slice(&self.protocol.to_le_bytes());
        out
    }

    fn from_bytes(bytes: &[u8; PORT_EVENT_SIZE]) -> Self {
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Self {
            index: word(0),
            size: word(4),
            protocol: word(8),
        }
    }
}

/// Create a ring of `capacity` bytes, split into its two ends.
pub fn event_ring(capacity: usize) -> (EventWriter, EventReader) {
    let capacity = capacity.max(PORT_EVENT_SIZE);
    let (producer, consumer) = HeapRb::<u8>::new(capacity).split();
    (
        EventWriter {
            producer,
            scratch: vec![0u8; capacity].into_boxed_slice(),
        },
        EventReader {
            consumer,
            scratch: vec![0u8; capacity].into_boxed_slice(),
        },
    )
}

/// Producer end.
pub struct EventWriter {
    producer: HeapProd<u8>,
    scratch: Box<[u8]>,
}

impl EventWriter {
    #[inline]
    pub fn can_write(&self, bytes: usize) -> bool {
        self.producer.vacant_len() >= bytes
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }

    /// Write header and payload as one unit. Returns false if it does not fit.
    pub fn write(&mut self, index: u32, protocol: u32, payload: &[u8]) -> bool {
        let total = PORT_EVENT_SIZE + payload.len();
        if total > self.scratch.len() || !self.can_write(total) {
            return false;
        }

        let header = PortEvent::new(index, payload.len() as u32, protocol);
        self.scratch[..PORT_EVENT_SIZE].copy_from_slice(&header.to_bytes());
        self.scratch[PORT_EVENT_SIZE..total].copy_from_slice(payload);
        let written = self.producer.push_slice(&self.scratch[..total]);
        debug_assert_eq!(written, total);
        true
    }

    /// Convenience for a float value under `protocol`.
    #[inline]
    pub fn write_float(&mut self, index: u32, protocol: u32, value: f32) -> bool {
        self.write(index, protocol, &value.to_le_bytes())
    }
}

/// Consumer end.
pub struct EventReader {
    consumer: HeapCons<u8>,
    scratch: Box<[u8]>,
}

impl EventReader {
    #[inline]
    pub fn can_read(&self, bytes: usize) -> bool {
        self.consumer.occupied_len() >= bytes
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    fn peek_header(&self) -> Option<PortEvent> {
        if !self.can_read(PORT_EVENT_SIZE) {
            return None;
        }
        let mut header = [0u8; PORT_EVENT_SIZE];
        for (dst, src) in header.iter_mut().zip(self.consumer.iter()) {
            *dst = *src;
        }
        Some(PortEvent::from_bytes(&header))
    }

    /// Pop the next complete event. The payload borrows the reader's scratch
    /// space and is valid until the next call.
    pub fn read(&mut self) -> Option<(PortEvent, &[u8])> {
        let header = self.peek_header()?;
        let size = header.size as usize;
        if size > self.scratch.len() || !self.can_read(PORT_EVENT_SIZE + size) {
            return None;
        }

        self.consumer.skip(PORT_EVENT_SIZE);
        let read = self.consumer.pop_slice(&mut self.scratch[..size]);
        debug_assert_eq!(read, size);
        Some((header, &self.scratch[..size]))
    }

    /// Read every complete event currently queued.
    pub fn drain(&mut self, mut f: impl FnMut(PortEvent, &[u8])) -> usize {
        let mut count = 0;
        while let Some((event, payload)) = self.read() {
            f(event, payload);
            count += 1;
        }
        count
    }
}

/// Decode a float payload written with [`EventWriter::write_float`].
#[inline]
pub fn decode_float(payload: &[u8]) -> Option<f32> {
    let bytes: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    Some(f32::from_le_bytes(bytes))
}
