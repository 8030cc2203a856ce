//! Module: sample
//!
//! Purpose: Sample storage for the transmit path. Bit depths, the scope-owned
//! stereo buffer handed to the bus, and the heap it is drawn from.
//!
//! Architecture:
//! - Interleaved stereo, right/left, 2 channels always
//! - 24-bit samples are stored in 32-bit slots
//! - Buffer memory comes from a [`SampleHeap`] and goes back to it on `Drop`,
//!   so every exit path releases it exactly once
//!
//! Safety: One unsafe block (byte view of the `u32` slots), see `as_bytes`.

use alloc::vec::Vec;

use crate::error::AudioError;

/// Channels per frame. Only stereo is supported.
pub const CHANNEL_COUNT: usize = 2;

/// Left channel slot value of the test pattern.
pub const LEFT_LEVEL: u32 = 0xFFFF_FFFF;

/// Right channel slot value of the test pattern.
pub const RIGHT_LEVEL: u32 = 0x0000_0000;

/// Bits per sample accepted by the I2S bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum BitDepth {
    Bits16 = 16,
    Bits24 = 24,
    Bits32 = 32,
}

impl BitDepth {
    /// Parse a raw bit count.
    pub fn from_bits(bits: u32) -> Result<Self, AudioError> {
        match bits {
            16 => Ok(BitDepth::Bits16),
            24 => Ok(BitDepth::Bits24),
            32 => Ok(BitDepth::Bits32),
            other => Err(AudioError::UnsupportedBitDepth(other)),
        }
    }

    /// Raw bit count.
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Storage bytes per sample. 24-bit samples occupy a full 32-bit slot.
    #[inline]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            BitDepth::Bits16 => 2,
            BitDepth::Bits24 | BitDepth::Bits32 => 4,
        }
    }

    /// Bytes per stereo frame.
    #[inline]
    pub const fn bytes_per_frame(self) -> usize {
        self.bytes_per_sample() * CHANNEL_COUNT
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

/// Source of sample buffer memory.
///
/// `reserve` is fallible so that an exhausted heap surfaces as
/// [`AudioError::Alloc`] instead of an abort inside the allocator.
pub trait SampleHeap {
    /// Reserve a zeroed buffer of `words` 32-bit slots.
    fn reserve(&self, words: usize) -> Result<Vec<u32>, AudioError>;

    /// Called once when a buffer of `words` slots is dropped.
    fn release(&self, words: usize) {
        let _ = words;
    }
}

impl<H: SampleHeap + ?Sized> SampleHeap for &H {
    fn reserve(&self, words: usize) -> Result<Vec<u32>, AudioError> {
        (**self).reserve(words)
    }

    fn release(&self, words: usize) {
        (**self).release(words)
    }
}

/// Global allocator, with fallible reservation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHeap;

impl SampleHeap for SystemHeap {
    fn reserve(&self, words: usize) -> Result<Vec<u32>, AudioError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(words)
            .map_err(|_| AudioError::Alloc {
                bytes: words.saturating_mul(4),
            })?;
        slots.resize(words, 0);
        Ok(slots)
    }
}

/// Interleaved stereo buffer, owned for the duration of one write.
///
/// Invariant: `byte_len() == frame_count() * 2 * bits_per_sample().bytes_per_sample()`.
pub struct SampleBuffer<'h, H: SampleHeap + ?Sized> {
    slots: Vec<u32>,
    frame_count: usize,
    bits: BitDepth,
    heap: &'h H,
}

impl<'h, H: SampleHeap + ?Sized> SampleBuffer<'h, H> {
    /// Allocate a buffer holding as many whole 32-bit-slot frames as fit in
    /// `capacity_bytes`. Trailing bytes that do not make a frame are unused.
    pub fn with_capacity(heap: &'h H, capacity_bytes: usize) -> Result<Self, AudioError> {
        let bits = BitDepth::Bits32;
        let frame_count = capacity_bytes / bits.bytes_per_frame();
        let slots = heap.reserve(frame_count * CHANNEL_COUNT)?;

        Ok(Self {
            slots,
            frame_count,
            bits,
            heap,
        })
    }

    /// Write the two-level pattern: left slot all ones, right slot all zeros.
    pub fn fill_test_pattern(&mut self) {
        for frame in self.slots.chunks_exact_mut(CHANNEL_COUNT) {
            frame[0] = LEFT_LEVEL;
            frame[1] = RIGHT_LEVEL;
        }
    }

    /// Number of stereo frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Storage width of each sample.
    #[inline]
    pub fn bits_per_sample(&self) -> BitDepth {
        self.bits
    }

    /// Always 2.
    #[inline]
    pub fn channel_count(&self) -> usize {
        CHANNEL_COUNT
    }

    /// Total payload length in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.frame_count * self.bits.bytes_per_frame()
    }

    /// Frames the bus will see when it reads this payload at `depth`.
    ///
    /// Differs from `frame_count()` whenever `depth` is not the storage width.
    #[inline]
    pub fn frames_at(&self, depth: BitDepth) -> usize {
        self.byte_len() / depth.bytes_per_frame()
    }

    /// Raw 32-bit slots, interleaved left/right.
    #[inline]
    pub fn samples(&self) -> &[u32] {
        &self.slots
    }

    /// Payload as bytes, native endianness, as the DMA engine reads it.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 has no padding and u8 has alignment 1; the slice covers
        // exactly the initialized slots and borrows `self` for its lifetime.
        unsafe {
            core::slice::from_raw_parts(
                self.slots.as_ptr() as *const u8,
                self.slots.len() * core::mem::size_of::<u32>(),
            )
        }
    }
}

impl<'h, H: SampleHeap + ?Sized> Drop for SampleBuffer<'h, H> {
    fn drop(&mut self) {
        self.heap.release(self.slots.len());
    }
}
