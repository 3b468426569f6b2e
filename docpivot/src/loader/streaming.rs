//! Chunked loader with incremental UTF-8 validation.
//!
//! The file is read in `chunk_size` pieces into a growing buffer. Each chunk
//! is validated as UTF-8 as it arrives; a multi-byte sequence split across a
//! chunk boundary is carried over to the next chunk. Invalid bytes stop the
//! load immediately, without reading the rest of the file.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{decode_json, LoaderOutput, ProgressReporter, Strategy};
use crate::error::{LoadError, LoadResult};
use crate::json::JsonCodec;

/// Default read size per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Share of the progress range spent on reading; the rest is decoding.
const READ_PROGRESS_SHARE: f64 = 0.9;

/// Reads a file in bounded chunks.
///
/// Errors are never recovered locally: encoding problems become
/// [`LoadError::Encoding`], malformed JSON becomes [`LoadError::Decode`]
/// tagged with [`Strategy::Streaming`], and I/O failures become
/// [`LoadError::Unexpected`].
#[derive(Debug, Clone)]
pub struct StreamingLoader {
    codec: JsonCodec,
    chunk_size: usize,
}

impl StreamingLoader {
    /// Create a loader. A `chunk_size` of zero is treated as the default.
    pub fn new(codec: JsonCodec, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { codec, chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn load(&self, path: &Path, progress: &mut ProgressReporter) -> LoadResult<LoaderOutput> {
        let io_error =
            |e: io::Error| LoadError::unexpected(format!("streaming {}: {}", path.display(), e));

        let mut file = File::open(path).map_err(io_error)?;
        let expected = file.metadata().map_err(io_error)?.len();

        progress.report(0.0);

        let mut buffer = Vec::with_capacity(initial_capacity(expected, self.chunk_size));
        let mut chunk = vec![0u8; self.chunk_size];
        // Start of the bytes not yet confirmed as complete UTF-8.
        let mut validated = 0usize;

        loop {
            let n = match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(e)),
            };
            buffer.extend_from_slice(&chunk[..n]);

            validated = validate_utf8_prefix(&buffer, validated, path)?;

            if expected > 0 {
                let consumed = buffer.len() as f64 / expected as f64;
                progress.report(READ_PROGRESS_SHARE * consumed.min(1.0));
            }
        }

        if validated != buffer.len() {
            // Truncated multi-byte sequence at end of file.
            return Err(LoadError::Encoding {
                path: path.to_path_buf(),
                offset: validated as u64,
            });
        }

        tracing::trace!(
            path = %path.display(),
            bytes = buffer.len(),
            chunk_size = self.chunk_size,
            "Streaming read complete"
        );

        let value = decode_json(&self.codec, &buffer, Strategy::Streaming)?;
        progress.finish();

        Ok(LoaderOutput {
            value,
            bytes_read: buffer.len() as u64,
            strategy_used: Strategy::Streaming,
        })
    }
}

/// Starting buffer size: one chunk, or the whole file when it is smaller.
fn initial_capacity(expected: u64, chunk_size: usize) -> usize {
    usize::try_from(expected).map_or(chunk_size, |len| len.min(chunk_size))
}

/// Validate `buffer[from..]` and return the new end of the validated prefix.
///
/// An incomplete sequence at the end is left for the next chunk; a genuinely
/// invalid sequence is an error.
fn validate_utf8_prefix(buffer: &[u8], from: usize, path: &Path) -> LoadResult<usize> {
    match std::str::from_utf8(&buffer[from..]) {
        Ok(_) => Ok(buffer.len()),
        Err(e) => match e.error_len() {
            None => Ok(from + e.valid_up_to()),
            Some(_) => Err(LoadError::Encoding {
                path: path.to_path_buf(),
                offset: (from + e.valid_up_to()) as u64,
            }),
        },
    }
}
