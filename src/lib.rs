//! # I2sPatternTx
//!
//! Transmit-only I2S test-pattern firmware for ESP32.
//!
//! ## Architecture
//!
//! Startup configures the bus once, then [`StreamWriter`] fills a buffer with
//! a two-level pattern (left all ones, right all zeros) and submits it with a
//! bounded wait:
//! - The bus is reached only through the [`Transport`] trait
//! - Buffer memory comes from a [`SampleHeap`] and is released on drop
//! - Pin muxing is behind [`hal::Board`], never in the writer
//! - Diagnostics go to a non-blocking [`LogStream`]

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod console_logger;
pub mod error;
pub mod hal;
pub mod logging;
pub mod sample;
pub mod writer;

pub use config::{I2sPort, PinConfig, TransportConfig};
pub use error::AudioError;
pub use logging::{LogLevel, LogStream};
pub use sample::{BitDepth, SampleBuffer, SampleHeap, SystemHeap};
pub use writer::{StreamWriter, Transport, WriteReport};
