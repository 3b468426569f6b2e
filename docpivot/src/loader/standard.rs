//! Whole-file loader.

use std::path::Path;

use super::{decode_utf8_json, LoaderOutput, ProgressReporter, Strategy};
use crate::error::{LoadError, LoadResult};
use crate::json::JsonCodec;

/// Reads the entire file into one buffer and decodes it in one pass.
///
/// Progress: `0.1` after the read, `1.0` after the decode.
#[derive(Debug, Clone)]
pub struct StandardLoader {
    codec: JsonCodec,
}

impl StandardLoader {
    pub fn new(codec: JsonCodec) -> Self {
        Self { codec }
    }

    pub fn load(&self, path: &Path, progress: &mut ProgressReporter) -> LoadResult<LoaderOutput> {
        let bytes = std::fs::read(path).map_err(|e| {
            LoadError::unexpected(format!("reading {}: {}", path.display(), e))
        })?;
        progress.report(0.1);

        let value = decode_utf8_json(&self.codec, &bytes, path, Strategy::Standard)?;
        progress.finish();

        Ok(LoaderOutput {
            value,
            bytes_read: bytes.len() as u64,
            strategy_used: Strategy::Standard,
        })
    }
}
