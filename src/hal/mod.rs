//! Hardware Abstraction Layer for I2sPatternTx.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! The writer stays in core modules, HAL is just I/O.

pub mod board;
#[cfg(target_os = "espidf")]
pub mod i2s;

pub use board::Board;

use crate::error::AudioError;

/// Result of handing one chunk to a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkWrite {
    /// Driver queued this many bytes.
    Accepted(usize),
    /// Deadline passed with nothing queued.
    TimedOut,
}

/// Feed `bytes` to `write_chunk` in pieces of at most `chunk_bytes`, sharing
/// one `timeout_ms` deadline across all of them.
///
/// Each call gets the milliseconds left until the deadline. Stops at the first
/// short or timed-out chunk and returns the total accepted; a driver error
/// aborts with that error.
pub fn write_chunked(
    bytes: &[u8],
    chunk_bytes: usize,
    timeout_ms: u32,
    mut now_us: impl FnMut() -> i64,
    mut write_chunk: impl FnMut(&[u8], u32) -> Result<ChunkWrite, AudioError>,
) -> Result<usize, AudioError> {
    let deadline_us = now_us() + i64::from(timeout_ms) * 1000;
    let mut accepted = 0;

    for chunk in bytes.chunks(chunk_bytes.max(1)) {
        let left_ms = ((deadline_us - now_us()).max(0) / 1000) as u32;

        match write_chunk(chunk, left_ms)? {
            ChunkWrite::Accepted(n) => {
                let n = n.min(chunk.len());
                accepted += n;
                if n < chunk.len() {
                    break;
                }
            }
            ChunkWrite::TimedOut => break,
        }
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_all_chunks_accepted() {
        let mut calls = 0;
        let total = write_chunked(&[0u8; 1000], 480, 100, || 0, |chunk, left| {
            calls += 1;
            assert_eq!(left, 100);
            Ok(ChunkWrite::Accepted(chunk.len()))
        })
        .unwrap();

        assert_eq!(total, 1000);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_deadline_shrinks_per_chunk() {
        let clock = Cell::new(0i64);
        let mut budgets = Vec::new();

        let total = write_chunked(
            &[0u8; 1440],
            480,
            100,
            || clock.get(),
            |chunk, left| {
                budgets.push(left);
                clock.set(clock.get() + 40_000);
                Ok(ChunkWrite::Accepted(chunk.len()))
            },
        )
        .unwrap();

        assert_eq!(total, 1440);
        assert_eq!(budgets, vec![100, 60, 20]);
    }

    #[test]
    fn test_timeout_keeps_partial_count() {
        let mut calls = 0;
        let total = write_chunked(&[0u8; 1440], 480, 100, || 0, |chunk, _| {
            calls += 1;
            if calls == 1 {
                Ok(ChunkWrite::Accepted(chunk.len()))
            } else {
                Ok(ChunkWrite::TimedOut)
            }
        })
        .unwrap();

        assert_eq!(total, 480);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_driver_error_aborts() {
        let result = write_chunked(&[0u8; 960], 480, 100, || 0, |_, _| {
            Err(AudioError::Transport(0x103))
        });

        assert_eq!(result, Err(AudioError::Transport(0x103)));
    }
}
