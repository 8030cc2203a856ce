//! Non-blocking diagnostics for the transmit path.
//!
//! ```text
//! StreamWriter           LogStream            idle loop
//! ────────────           ─────────            ─────────
//!
//! tx_info!() ─────────▶ [L0][L1][L2] ──────▶ console
//! never blocks            fixed ring          blocking ok
//! ```
//!
//! The writer sits next to a blocking bus call, so it must not add a second
//! blocking call (console I/O) to the same path. Entries go into a fixed ring;
//! the idle loop drains them. When the ring is full the entry is dropped and
//! counted.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Default ring size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Upper-case tag used by the console output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Timestamp in microseconds since boot.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Valid bytes in `msg`.
    pub len: u8,
    /// Message bytes, not null-terminated.
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Invalid UTF-8 is replaced by a marker.
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fixed-size log ring. One producer task pushes, one consumer drains in order.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: only the producer advances write_idx and only the consumer advances
// read_idx; an index is never written while it is readable.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create an empty stream. `N` must be a power of two.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue an entry. Returns `false` if the ring was full and the entry dropped.
    ///
    /// Messages longer than [`MAX_MSG_LEN`] are truncated.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let slot = self.write_idx.fetch_add(1, Ordering::AcqRel);
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: the ring was not full, so the consumer is not reading `slot`.
        unsafe {
            let entry = &mut (*self.entries.get())[slot as usize & Self::MASK];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        true
    }

    /// Take the oldest entry, if any.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: single consumer; the slot at `read` is fully written.
        let entry = unsafe { (*self.entries.get())[read as usize & Self::MASK] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Entries dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the drop counter after reporting it.
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format into a fixed buffer, truncating on overflow.
///
/// Returns the number of bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = SliceWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// `fmt::Write` over a byte slice. Excess input is discarded.
pub(crate) struct SliceWriter<'a> {
    pub(crate) buf: &'a mut [u8],
    pub(crate) pos: usize,
}

impl core::fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let mut n = bytes.len().min(self.buf.len() - self.pos);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        Ok(())
    }
}

/// Push a formatted message into a [`LogStream`].
///
/// ```ignore
/// tx_log!(LogLevel::Info, log, now_us, "wrote {} bytes", n);
/// ```
#[macro_export]
macro_rules! tx_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! tx_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::tx_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! tx_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::tx_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! tx_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::tx_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_drain() {
        let stream = LogStream::<8>::new();

        assert!(stream.push(1000, LogLevel::Info, b"wrote 96 bytes out of 96"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.text(), "wrote 96 bytes out of 96");
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_full_ring_drops_and_counts() {
        let stream = LogStream::<2>::new();

        assert!(stream.push(1, LogLevel::Info, b"a"));
        assert!(stream.push(2, LogLevel::Info, b"b"));
        assert!(!stream.push(3, LogLevel::Warn, b"c"));
        assert_eq!(stream.dropped(), 1);

        assert_eq!(stream.drain().unwrap().text(), "a");
        assert!(stream.push(4, LogLevel::Info, b"d"));
        assert_eq!(stream.drain().unwrap().text(), "b");
        assert_eq!(stream.drain().unwrap().text(), "d");

        stream.reset_dropped();
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<2>::new();
        let long = [b'x'; MAX_MSG_LEN + 20];

        stream.push(0, LogLevel::Debug, &long);
        let entry = stream.drain().unwrap();
        assert_eq!(entry.len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_macro_formats_into_stream() {
        let stream = LogStream::<4>::new();
        crate::tx_warn!(stream, 42, "accepted {} of {}", 480, 5760);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.text(), "accepted 480 of 5760");
    }

    #[test]
    fn test_truncation_keeps_whole_characters() {
        let mut buf = [0u8; 6];
        // 'µ' is two bytes and would straddle the end.
        let len = format_to_buffer(&mut buf, format_args!("{} µs", "MCLK"));
        assert_eq!(&buf[..len], b"MCLK ");

        let stream = LogStream::<2>::new();
        stream.push(0, LogLevel::Info, &buf[..len]);
        assert_eq!(stream.drain().unwrap().text(), "MCLK ");
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 5];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello");
    }
}
