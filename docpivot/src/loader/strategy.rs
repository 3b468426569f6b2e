//! Loading strategy selection.

use std::fmt;

/// How a file's bytes are brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Read the whole file into one buffer.
    Standard,
    /// Read in fixed-size chunks.
    Streaming,
    /// Map the file read-only.
    MemoryMapped,
}

impl Strategy {
    /// Short name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Standard => "standard",
            Strategy::Streaming => "streaming",
            Strategy::MemoryMapped => "mmap",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choose a strategy from the file size and explicit overrides.
///
/// Forcing streaming wins over forcing standard. Without overrides, files
/// below `streaming_threshold` load in one read, files below
/// `large_file_threshold` stream, and anything larger is memory-mapped.
pub fn choose_strategy(
    size_bytes: u64,
    force_streaming: bool,
    force_standard: bool,
    streaming_threshold: u64,
    large_file_threshold: u64,
) -> Strategy {
    if force_streaming {
        Strategy::Streaming
    } else if force_standard {
        Strategy::Standard
    } else if size_bytes < streaming_threshold {
        Strategy::Standard
    } else if size_bytes < large_file_threshold {
        Strategy::Streaming
    } else {
        Strategy::MemoryMapped
    }
}
