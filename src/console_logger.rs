//! Console output of [`LogStream`] entries.
//!
//! The idle loop drains the stream into whatever sink the binary provides
//! (stdout on the ESP-IDF console UART). Formatting lives here so it is the
//! same on target and host.
//!
//! Line format: `[timestamp_us] LEVEL: message\n`

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream, SliceWriter, MAX_MSG_LEN};

/// Buffer size for one formatted line.
pub const LINE_BUF_LEN: usize = MAX_MSG_LEN + 32;

/// Format one entry into `buf`. Returns bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = SliceWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    );
    writer.pos
}

/// Write every pending entry to `sink`, oldest first, then a summary line if
/// entries were dropped since the last call. Returns lines written.
pub fn drain_to<const N: usize>(stream: &LogStream<N>, mut sink: impl FnMut(&[u8])) -> usize {
    let mut line = [0u8; LINE_BUF_LEN];
    let mut lines = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut line);
        sink(&line[..len]);
        lines += 1;
    }

    let dropped = stream.dropped();
    if dropped > 0 {
        let mut writer = SliceWriter { buf: &mut line, pos: 0 };
        let _ = write!(writer, "[WARN] Dropped: {} log entries\n", dropped);
        let len = writer.pos;
        sink(&line[..len]);
        stream.reset_dropped();
        lines += 1;
    }

    lines
}
