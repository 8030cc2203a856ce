//! Module: config
//!
//! Purpose: Build-time configuration of the I2S bus and board.
//!
//! Architecture:
//! - All values are compile-time constants, fixed for the process lifetime
//! - Feature `bits32` selects the alternate 32-bit / 256×MCLK setup
//! - [`TransportConfig`] is handed to the driver once at startup and never
//!   mutated by the writer
//!
//! Safety: Safe. Plain data.

use crate::error::AudioError;
use crate::sample::{BitDepth, CHANNEL_COUNT};

/// Sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Normal setup: 48Fs BCK, 384Fs MCLK.
#[cfg(not(feature = "bits32"))]
pub const BITS: BitDepth = BitDepth::Bits24;
#[cfg(not(feature = "bits32"))]
pub const MCLK_MULTIPLE: u32 = 384;

/// Alternate setup: 64Fs BCK, 256Fs MCLK. Only the top 24 bits of each
/// 32-bit slot are meaningful to a 24-bit codec.
#[cfg(feature = "bits32")]
pub const BITS: BitDepth = BitDepth::Bits32;
#[cfg(feature = "bits32")]
pub const MCLK_MULTIPLE: u32 = 256;

/// DMA descriptors in the transmit queue.
pub const DMA_BUFFER_COUNT: u32 = 6;

/// Frames per DMA descriptor.
pub const FRAMES_PER_BUFFER: u32 = 60;

/// Sample buffer capacity in bytes. Independent of bit depth.
pub const BUFFER_CAPACITY_BYTES: usize = 6 * 60 * 4 * 4;

/// Bounded wait for one buffer submission.
pub const WRITE_TIMEOUT_MS: u32 = 100;

/// Idle loop period.
pub const IDLE_PERIOD_MS: u32 = 5000;

/// I2S controller instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum I2sPort {
    I2s0,
    I2s1,
}

/// Bus pin assignment. Transmit only, so no data-in pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub bck: u8,
    pub ws: u8,
    pub dout: u8,
    pub din: Option<u8>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            bck: 13,
            ws: 15,
            dout: 21,
            din: None,
        }
    }
}

/// I2S transmit configuration.
///
/// `port` selects both the controller the driver is installed on and the
/// MCLK source routed to `clk_out_pin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    pub port: I2sPort,
    pub sample_rate_hz: u32,
    pub bits: BitDepth,
    /// Always 2, right/left interleaved.
    pub channels: u8,
    /// MCLK = sample_rate_hz * mclk_multiple.
    pub mclk_multiple: u32,
    pub dma_buffer_count: u32,
    pub frames_per_buffer: u32,
    /// Use the audio PLL as clock source.
    pub use_apll: bool,
    pub pins: PinConfig,
    /// GPIO carrying the master clock out (CLK_OUT1).
    pub clk_out_pin: u8,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: I2sPort::I2s1,
            sample_rate_hz: SAMPLE_RATE_HZ,
            bits: BITS,
            channels: CHANNEL_COUNT as u8,
            mclk_multiple: MCLK_MULTIPLE,
            dma_buffer_count: DMA_BUFFER_COUNT,
            frames_per_buffer: FRAMES_PER_BUFFER,
            use_apll: true,
            pins: PinConfig::default(),
            clk_out_pin: 0,
        }
    }
}

impl TransportConfig {
    /// Master clock frequency in Hz.
    #[inline]
    pub fn mclk_hz(&self) -> u32 {
        self.sample_rate_hz.saturating_mul(self.mclk_multiple)
    }

    /// Bytes one DMA descriptor holds.
    #[inline]
    pub fn dma_chunk_bytes(&self) -> usize {
        self.frames_per_buffer as usize * self.bits.bytes_per_frame()
    }

    /// Bytes the whole DMA queue holds.
    #[inline]
    pub fn queue_bytes(&self) -> usize {
        self.dma_chunk_bytes() * self.dma_buffer_count as usize
    }

    /// Check the values against what the driver accepts.
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.channels as usize != CHANNEL_COUNT {
            return Err(AudioError::InvalidConfig("channels must be 2"));
        }
        if self.sample_rate_hz == 0 {
            return Err(AudioError::InvalidConfig("sample rate is zero"));
        }
        if !matches!(self.mclk_multiple, 128 | 256 | 384) {
            return Err(AudioError::InvalidConfig("mclk multiple not in 128/256/384"));
        }
        if !(2..=128).contains(&self.dma_buffer_count) {
            return Err(AudioError::InvalidConfig("dma buffer count not in 2..=128"));
        }
        if !(8..=1024).contains(&self.frames_per_buffer) {
            return Err(AudioError::InvalidConfig("frames per buffer not in 8..=1024"));
        }
        if self.pins.din.is_some() {
            return Err(AudioError::InvalidConfig("transmit only, din must be unset"));
        }
        let PinConfig { bck, ws, dout, .. } = self.pins;
        if bck == ws || bck == dout || ws == dout {
            return Err(AudioError::InvalidConfig("bck, ws and dout must be distinct"));
        }
        if [bck, ws, dout].contains(&self.clk_out_pin) {
            return Err(AudioError::InvalidConfig("clock out pin overlaps a bus pin"));
        }
        Ok(())
    }
}
