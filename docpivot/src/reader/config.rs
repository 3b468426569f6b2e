//! Loader configuration.

use crate::config::ConfigError;
use crate::loader::DEFAULT_CHUNK_SIZE;

/// Files at or above this size stream instead of loading in one read.
pub const DEFAULT_STREAMING_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// Files at or above this size are memory-mapped.
pub const DEFAULT_LARGE_FILE_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Settings for an [`AdaptiveDocumentLoader`](super::AdaptiveDocumentLoader).
///
/// `force_streaming` and `force_standard` are defaults; a
/// [`LoadRequest`](super::LoadRequest) can override them per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub force_streaming: bool,
    pub force_standard: bool,
    pub enable_caching: bool,
    /// Prefer the fastest compiled-in JSON backend.
    pub use_fast_json_backend: bool,
    pub streaming_threshold_bytes: u64,
    pub large_file_threshold_bytes: u64,
    /// Read size for the streaming loader.
    pub chunk_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            force_streaming: false,
            force_standard: false,
            enable_caching: true,
            use_fast_json_backend: true,
            streaming_threshold_bytes: DEFAULT_STREAMING_THRESHOLD_BYTES,
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl LoaderConfig {
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }

    pub fn with_fast_json_backend(mut self, enabled: bool) -> Self {
        self.use_fast_json_backend = enabled;
        self
    }

    pub fn with_streaming_threshold(mut self, bytes: u64) -> Self {
        self.streaming_threshold_bytes = bytes;
        self
    }

    pub fn with_large_file_threshold(mut self, bytes: u64) -> Self {
        self.large_file_threshold_bytes = bytes;
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub fn with_force_streaming(mut self, force: bool) -> Self {
        self.force_streaming = force;
        self
    }

    pub fn with_force_standard(mut self, force: bool) -> Self {
        self.force_standard = force;
        self
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.streaming_threshold_bytes > self.large_file_threshold_bytes {
            return Err(ConfigError::Invalid(format!(
                "streaming_threshold ({}) cannot exceed large_file_threshold ({})",
                self.streaming_threshold_bytes, self.large_file_threshold_bytes
            )));
        }
        Ok(())
    }
}
