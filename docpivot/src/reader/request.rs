//! Per-call load options.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::loader::ProgressSink;

/// A single load call.
///
/// Unset overrides fall back to the loader's [`LoaderConfig`](super::LoaderConfig).
#[derive(Clone)]
pub struct LoadRequest {
    pub path: PathBuf,
    pub force_streaming: Option<bool>,
    pub force_standard: Option<bool>,
    pub progress: Option<ProgressSink>,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            force_streaming: None,
            force_standard: None,
            progress: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn force_streaming(mut self, force: bool) -> Self {
        self.force_streaming = Some(force);
        self
    }

    pub fn force_standard(mut self, force: bool) -> Self {
        self.force_standard = Some(force);
        self
    }

    /// Receive progress fractions during the load. Cache hits report nothing.
    pub fn with_progress(mut self, sink: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }
}

impl From<PathBuf> for LoadRequest {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for LoadRequest {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for LoadRequest {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("path", &self.path)
            .field("force_streaming", &self.force_streaming)
            .field("force_standard", &self.force_standard)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
