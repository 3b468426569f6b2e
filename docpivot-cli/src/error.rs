//! CLI error type and exit codes.

use std::fmt;

use docpivot::config::ConfigError;
use docpivot::LoadError;

/// Exit codes, following the BSD `sysexits` conventions.
pub mod exit_code {
    pub const FAILURE: i32 = 1;
    pub const DATA_ERROR: i32 = 65;
    pub const NO_INPUT: i32 = 66;
    pub const SOFTWARE: i32 = 70;
    pub const NO_PERMISSION: i32 = 77;
    pub const CONFIG: i32 = 78;
}

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// A single document failed to load.
    Load(LoadError),
    /// Some documents in a batch failed; each was already reported.
    LoadFailures {
        failed: usize,
        total: usize,
        exit_code: i32,
    },
    /// Files that do not look like Docling JSON.
    Undetected(usize),
    /// Invalid or unreadable configuration.
    Config(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Load(e) => load_exit_code(e),
            CliError::LoadFailures { exit_code, .. } => *exit_code,
            CliError::Undetected(_) => exit_code::FAILURE,
            CliError::Config(_) => exit_code::CONFIG,
        }
    }
}

/// Exit code for a load failure category.
pub fn load_exit_code(err: &LoadError) -> i32 {
    match err {
        LoadError::FileNotFound { .. } | LoadError::FileIsDirectory { .. } => exit_code::NO_INPUT,
        LoadError::PermissionDenied { .. } => exit_code::NO_PERMISSION,
        LoadError::Encoding { .. } | LoadError::Decode { .. } | LoadError::Schema(_) => {
            exit_code::DATA_ERROR
        }
        LoadError::Unexpected { .. } => exit_code::SOFTWARE,
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Load(e) => write!(f, "{}", e),
            CliError::LoadFailures { failed, total, .. } => {
                write!(f, "{} of {} documents failed to load", failed, total)
            }
            CliError::Undetected(count) => {
                write!(f, "{} file(s) are not Docling JSON documents", count)
            }
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        CliError::Load(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
