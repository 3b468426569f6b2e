//! File identity used for cache staleness checks.

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Metadata needed to decide whether a file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size_bytes: u64,
    /// Modification time as nanoseconds since the Unix epoch. Times before
    /// the epoch or on filesystems without mtimes read as zero.
    pub modified_time_nanos: u128,
    pub is_dir: bool,
}

/// Filesystem access the loader and cache need.
///
/// Production code uses [`OsFileSystem`]; tests inject doubles to simulate
/// stat failures.
pub trait FileSystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = std::fs::metadata(path)?;
        let modified_time_nanos = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        Ok(FileStat {
            size_bytes: metadata.len(),
            modified_time_nanos,
            is_dir: metadata.is_dir(),
        })
    }
}

/// Path plus size and modification time.
///
/// Two identities are equal only when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_time_nanos: u128,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, modified_time_nanos: u128) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            modified_time_nanos,
        }
    }

    /// Build an identity from a stat result.
    pub fn from_stat(path: impl Into<PathBuf>, stat: &FileStat) -> Self {
        Self::new(path, stat.size_bytes, stat.modified_time_nanos)
    }

    /// Stat `path` and build its current identity.
    pub fn current(fs: &dyn FileSystem, path: &Path) -> io::Result<Self> {
        let stat = fs.stat(path)?;
        Ok(Self::from_stat(path, &stat))
    }
}
