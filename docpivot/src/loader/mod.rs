//! Byte-level loaders.
//!
//! Each loader turns a file into a [`ParsedValue`] using one I/O strategy.
//! All of them validate UTF-8 before decoding, so invalid encoding is always
//! reported as [`LoadError::Encoding`] no matter which path ran.
//!
//! # Failure policy
//!
//! - [`StandardLoader`] and [`StreamingLoader`] surface every error.
//! - [`MmapLoader`] recovers from mapping failures by running the standard
//!   loader. Decode and encoding errors after a successful map are surfaced.
//!
//! Buffers and maps are owned by the loader call and released on every exit
//! path, including unwinding.

mod mmap;
mod progress;
mod standard;
mod strategy;
mod streaming;

use std::path::Path;

pub use mmap::{MemoryMapper, MmapLoader, OsMapper};
pub use progress::{ProgressReporter, ProgressSink};
pub use standard::StandardLoader;
pub use strategy::{choose_strategy, Strategy};
pub use streaming::{StreamingLoader, DEFAULT_CHUNK_SIZE};

use crate::error::{LoadError, LoadResult};
use crate::json::{JsonCodec, ParsedValue};

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOutput {
    pub value: ParsedValue,
    /// Bytes consumed from the file.
    pub bytes_read: u64,
    /// Strategy that produced the value (differs from the requested one after
    /// an mmap fallback).
    pub strategy_used: Strategy,
}

/// Check UTF-8 and decode `bytes` as JSON.
pub(crate) fn decode_utf8_json(
    codec: &JsonCodec,
    bytes: &[u8],
    path: &Path,
    strategy: Strategy,
) -> LoadResult<ParsedValue> {
    if let Err(e) = std::str::from_utf8(bytes) {
        return Err(LoadError::Encoding {
            path: path.to_path_buf(),
            offset: e.valid_up_to() as u64,
        });
    }
    decode_json(codec, bytes, strategy)
}

/// Decode already-validated UTF-8.
pub(crate) fn decode_json(
    codec: &JsonCodec,
    bytes: &[u8],
    strategy: Strategy,
) -> LoadResult<ParsedValue> {
    codec.decode(bytes).map_err(|failure| LoadError::Decode {
        offset: failure.offset,
        message: failure.to_string(),
        strategy,
    })
}
