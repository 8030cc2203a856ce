//! I2S transmit transport on the ESP-IDF std-mode driver.

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::i2s::config::{
    ClockSource, Config, DataBitWidth, MclkMultiple, Role, SlotMode, StdClkConfig, StdConfig,
    StdGpioConfig, StdSlotConfig,
};
use esp_idf_svc::hal::i2s::{I2sDriver, I2sTx};
use esp_idf_svc::sys::{esp_timer_get_time, EspError, ESP_ERR_TIMEOUT};

use crate::config::TransportConfig;
use crate::error::AudioError;
use crate::hal::{write_chunked, ChunkWrite};
use crate::sample::BitDepth;
use crate::writer::Transport;

/// Microseconds since boot.
#[inline]
pub fn now_us() -> i64 {
    // SAFETY: esp_timer is started by the IDF before app_main.
    unsafe { esp_timer_get_time() }
}

/// Driver configuration for `config`: controller role, stereo Philips slots.
pub fn std_config(config: &TransportConfig) -> StdConfig {
    let width = match config.bits {
        BitDepth::Bits16 => DataBitWidth::Bits16,
        BitDepth::Bits24 => DataBitWidth::Bits24,
        BitDepth::Bits32 => DataBitWidth::Bits32,
    };
    let mclk = match config.mclk_multiple {
        128 => MclkMultiple::M128,
        256 => MclkMultiple::M256,
        _ => MclkMultiple::M384,
    };

    let channel = Config::default()
        .role(Role::Controller)
        .dma_buffer_count(config.dma_buffer_count)
        .frames_per_buffer(config.frames_per_buffer);

    let clock = StdClkConfig::from_sample_rate_hz(config.sample_rate_hz)
        .clk_src(clock_source(config.use_apll))
        .mclk_multiple(mclk);

    StdConfig::new(
        channel,
        clock,
        StdSlotConfig::philips_slot_default(width, SlotMode::Stereo),
        StdGpioConfig::default(),
    )
}

#[cfg(any(esp32, esp32s2))]
fn clock_source(use_apll: bool) -> ClockSource {
    if use_apll {
        ClockSource::Apll
    } else {
        ClockSource::default()
    }
}

#[cfg(not(any(esp32, esp32s2)))]
fn clock_source(_use_apll: bool) -> ClockSource {
    ClockSource::default()
}

/// Installed TX channel plus the depth it was configured for.
pub struct I2sTransport<'d> {
    driver: I2sDriver<'d, I2sTx>,
    bits: BitDepth,
    chunk_bytes: usize,
}

impl<'d> I2sTransport<'d> {
    /// Take an installed driver and enable transmission.
    pub fn new(mut driver: I2sDriver<'d, I2sTx>, config: &TransportConfig) -> Result<Self, EspError> {
        driver.tx_enable()?;

        Ok(Self {
            driver,
            bits: config.bits,
            chunk_bytes: config.dma_chunk_bytes(),
        })
    }
}

impl Transport for I2sTransport<'_> {
    fn bits_per_sample(&self) -> BitDepth {
        self.bits
    }

    /// The driver reports nothing on timeout, so the payload goes out one DMA
    /// descriptor at a time and the count of completed chunks is kept.
    ///
    /// The count is a lower bound: a chunk that times out counts as zero even
    /// if the driver had already queued part of it.
    fn write(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<usize, AudioError> {
        let driver = &mut self.driver;

        write_chunked(bytes, self.chunk_bytes, timeout_ms, now_us, |chunk, left_ms| {
            match driver.write(chunk, TickType::new_millis(u64::from(left_ms)).into()) {
                Ok(n) => Ok(ChunkWrite::Accepted(n)),
                Err(e) if e.code() == ESP_ERR_TIMEOUT as i32 => Ok(ChunkWrite::TimedOut),
                Err(e) => Err(AudioError::Transport(e.code())),
            }
        })
    }
}
