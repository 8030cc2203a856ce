//! Streaming audio buffer writer.
//!
//! Builds the two-level test pattern in a scope-owned buffer and submits it
//! to the bus with a bounded wait:
//!
//! ```text
//! validate depth ─▶ reserve ─▶ fill ─▶ write(≤100 ms) ─▶ report ─▶ drop
//!        │              │                    │
//!        └─ mismatch    └─ Alloc             └─ partial: logged, not an error
//! ```
//!
//! The buffer is laid out in 32-bit slots whatever depth the bus runs at.
//! At 16 or 24 bits the bus therefore frames the payload differently from
//! how it was written; this is reported with a warning and left as-is.

use crate::config::{BUFFER_CAPACITY_BYTES, WRITE_TIMEOUT_MS};
use crate::error::AudioError;
use crate::logging::LogStream;
use crate::sample::{BitDepth, SampleBuffer, SampleHeap};
use crate::{tx_info, tx_warn};

/// The audio bus as seen by the writer.
///
/// Implementations own the driver and its bounded queue; the writer only
/// submits bytes through `write`.
pub trait Transport {
    /// Depth the bus was configured for.
    fn bits_per_sample(&self) -> BitDepth;

    /// Queue `bytes`, blocking at most `timeout_ms`.
    ///
    /// Returns how many bytes were accepted. Fewer than `bytes.len()` means
    /// the queue stayed full until the deadline; that is not an error.
    fn write(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<usize, AudioError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bits_per_sample(&self) -> BitDepth {
        (**self).bits_per_sample()
    }

    fn write(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<usize, AudioError> {
        (**self).write(bytes, timeout_ms)
    }
}

/// Outcome of one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteReport {
    /// Bytes offered to the bus.
    pub requested: usize,
    /// Bytes the bus accepted before the deadline. Never above `requested`.
    pub accepted: usize,
}

impl WriteReport {
    /// All bytes were queued.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.accepted == self.requested
    }

    /// Bytes dropped at the deadline.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.requested.saturating_sub(self.accepted)
    }
}

/// Writes the test pattern to a [`Transport`].
pub struct StreamWriter<'a, T: Transport, H: SampleHeap> {
    transport: T,
    heap: H,
    log: &'a LogStream,
    clock: fn() -> i64,
    capacity_bytes: usize,
    timeout_ms: u32,
}

impl<'a, T: Transport, H: SampleHeap> StreamWriter<'a, T, H> {
    /// Writer with the default capacity and timeout.
    ///
    /// `clock` returns microseconds since boot and only stamps log entries.
    pub fn new(transport: T, heap: H, log: &'a LogStream, clock: fn() -> i64) -> Self {
        Self {
            transport,
            heap,
            log,
            clock,
            capacity_bytes: BUFFER_CAPACITY_BYTES,
            timeout_ms: WRITE_TIMEOUT_MS,
        }
    }

    /// Override the buffer capacity in bytes.
    pub fn with_capacity(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    /// Override the bounded wait.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fill a fresh buffer with the pattern and submit it once.
    ///
    /// `bits_per_sample` must be 16, 24 or 32 and equal to the depth the
    /// transport runs at. Nothing is allocated or written when it is not.
    ///
    /// The buffer is released before this returns, on every path.
    pub fn fill_and_send(&mut self, bits_per_sample: u32) -> Result<WriteReport, AudioError> {
        let requested_depth = BitDepth::from_bits(bits_per_sample)?;
        let configured = self.transport.bits_per_sample();
        if requested_depth != configured {
            return Err(AudioError::ConfigMismatch {
                configured,
                requested: requested_depth,
            });
        }

        let mut buffer = SampleBuffer::with_capacity(&self.heap, self.capacity_bytes)?;
        buffer.fill_test_pattern();

        if requested_depth != buffer.bits_per_sample() {
            tx_warn!(
                self.log,
                (self.clock)(),
                "{}-bit slots sent on {}-bit bus: {} frames written, {} on the wire",
                buffer.bits_per_sample().bits(),
                requested_depth.bits(),
                buffer.frame_count(),
                buffer.frames_at(requested_depth)
            );
        }

        let payload = buffer.as_bytes();
        let requested = payload.len();
        let accepted = self.transport.write(payload, self.timeout_ms)?;

        if accepted > requested {
            tx_warn!(
                self.log,
                (self.clock)(),
                "transport reported {} bytes for a {} byte write",
                accepted,
                requested
            );
        }
        let report = WriteReport {
            requested,
            accepted: accepted.min(requested),
        };

        tx_info!(
            self.log,
            (self.clock)(),
            "wrote {} bytes out of {}",
            report.accepted,
            report.requested
        );
        if !report.is_complete() {
            tx_warn!(
                self.log,
                (self.clock)(),
                "queue full after {} ms, {} bytes dropped",
                self.timeout_ms,
                report.dropped()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SystemHeap;

    struct SinkTransport {
        depth: BitDepth,
        last: Vec<u8>,
    }

    impl Transport for SinkTransport {
        fn bits_per_sample(&self) -> BitDepth {
            self.depth
        }

        fn write(&mut self, bytes: &[u8], _timeout_ms: u32) -> Result<usize, AudioError> {
            self.last = bytes.to_vec();
            Ok(bytes.len())
        }
    }

    fn zero_clock() -> i64 {
        0
    }

    #[test]
    fn test_payload_is_native_endian_pattern() {
        let log = LogStream::new();
        let sink = SinkTransport { depth: BitDepth::Bits32, last: Vec::new() };
        let mut writer = StreamWriter::new(sink, SystemHeap, &log, zero_clock).with_capacity(16);

        writer.fill_and_send(32).unwrap();

        let bytes = &writer.transport().last;
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &0xFFFF_FFFFu32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &0u32.to_ne_bytes());
    }

    #[test]
    fn test_slot_mismatch_warns_before_report() {
        let log = LogStream::new();
        let sink = SinkTransport { depth: BitDepth::Bits16, last: Vec::new() };
        let mut writer = StreamWriter::new(sink, SystemHeap, &log, zero_clock).with_capacity(96);

        writer.fill_and_send(16).unwrap();

        let first = log.drain().unwrap();
        assert!(first.text().contains("12 frames written, 24 on the wire"));
        assert_eq!(log.drain().unwrap().text(), "wrote 96 bytes out of 96");
    }
}
