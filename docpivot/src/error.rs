//! Error taxonomy for document loading.
//!
//! Every failed load yields exactly one [`LoadError`] variant so callers can
//! render an actionable message instead of a generic "load failed".

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::loader::Strategy;
use crate::schema::SchemaViolation;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading a document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The path points at a directory.
    #[error("Path is a directory, not a file: {}", path.display())]
    FileIsDirectory { path: PathBuf },

    /// The file exists but cannot be opened for reading.
    #[error("Permission denied reading {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// The file content is not valid UTF-8.
    #[error("Unable to decode {} as UTF-8: invalid byte sequence at offset {offset}", path.display())]
    Encoding { path: PathBuf, offset: u64 },

    /// The content is not well-formed JSON.
    #[error("Invalid JSON ({strategy} load){}: {message}", format_offset(*offset))]
    Decode {
        offset: Option<u64>,
        message: String,
        strategy: Strategy,
    },

    /// The JSON does not describe a valid document.
    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    /// Anything not classified above.
    #[error("Unexpected error: {cause}")]
    Unexpected { cause: String },
}

fn format_offset(offset: Option<u64>) -> String {
    match offset {
        Some(offset) => format!(" at byte {}", offset),
        None => String::new(),
    }
}

impl LoadError {
    /// Wrap an unclassified failure.
    pub fn unexpected(cause: impl ToString) -> Self {
        LoadError::Unexpected {
            cause: cause.to_string(),
        }
    }

    /// Classify a failed stat of `path`.
    ///
    /// Anything but a permission problem means the path does not name an
    /// existing file: a missing entry, a regular file used as a directory,
    /// a symlink loop or an over-long name.
    pub fn from_stat(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied { path },
            _ => LoadError::FileNotFound { path },
        }
    }

    /// Classify an I/O error from a precondition check on `path`.
    ///
    /// Only the precondition kinds are mapped to dedicated variants; any other
    /// kind is reported as [`LoadError::Unexpected`].
    pub fn from_precondition(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => LoadError::FileNotFound { path },
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied { path },
            _ => LoadError::Unexpected {
                cause: format!("{}: {}", path.display(), err),
            },
        }
    }

    /// Short machine-readable code for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LoadError::FileIsDirectory { .. } => "FILE_IS_DIRECTORY",
            LoadError::PermissionDenied { .. } => "PERMISSION_DENIED",
            LoadError::Encoding { .. } => "ENCODING_ERROR",
            LoadError::Decode { .. } => "DECODE_ERROR",
            LoadError::Schema(_) => "SCHEMA_VIOLATION",
            LoadError::Unexpected { .. } => "UNEXPECTED_LOAD_ERROR",
        }
    }
}
