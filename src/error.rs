//! Error types for the transmit path

use crate::sample::BitDepth;

/// Everything that can stop a buffer from reaching the bus.
///
/// A partial write is not an error: see [`crate::writer::WriteReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// E01: Sample buffer could not be allocated
    Alloc { bytes: usize },
    /// E02: Bits per sample is not 16, 24 or 32
    UnsupportedBitDepth(u32),
    /// E03: Requested depth differs from what the bus was configured for
    ConfigMismatch {
        configured: BitDepth,
        requested: BitDepth,
    },
    /// E04: Transport configuration out of range
    InvalidConfig(&'static str),
    /// E05: Driver returned an ESP-IDF error code
    Transport(i32),
}

impl AudioError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Alloc { .. } => "E01",
            Self::UnsupportedBitDepth(_) => "E02",
            Self::ConfigMismatch { .. } => "E03",
            Self::InvalidConfig(_) => "E04",
            Self::Transport(_) => "E05",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Alloc { .. } => "allocation failed",
            Self::UnsupportedBitDepth(_) => "unsupported bit depth",
            Self::ConfigMismatch { .. } => "configuration mismatch",
            Self::InvalidConfig(_) => "invalid config",
            Self::Transport(_) => "transport error",
        }
    }

    /// True for errors the firmware cannot continue after.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Alloc { .. })
    }
}

impl core::fmt::Display for AudioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match self {
            Self::Alloc { bytes } => write!(f, " ({} bytes)", bytes),
            Self::UnsupportedBitDepth(bits) => write!(f, " ({})", bits),
            Self::ConfigMismatch { configured, requested } => write!(
                f,
                " (configured {} bits, requested {} bits)",
                configured.bits(),
                requested.bits()
            ),
            Self::InvalidConfig(what) => write!(f, " ({})", what),
            Self::Transport(code) => write!(f, " (esp_err {})", code),
        }
    }
}
