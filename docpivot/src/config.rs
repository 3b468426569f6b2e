//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.docpivot/config.ini`:
//!
//! ```ini
//! [loader]
//! streaming_threshold = 10MB
//! large_file_threshold = 100MB
//! chunk_size = 8KB
//! force_streaming = false
//! force_standard = false
//!
//! [cache]
//! enabled = true
//!
//! [json]
//! fast_backend = true
//!
//! [logging]
//! level = info
//! file = /var/log/docpivot.log
//! ```
//!
//! A missing file means defaults. Unknown sections and keys are ignored so
//! older binaries can read newer files.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::loader::DEFAULT_CHUNK_SIZE;
use crate::reader::{LoaderConfig, DEFAULT_LARGE_FILE_THRESHOLD_BYTES, DEFAULT_STREAMING_THRESHOLD_BYTES};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Log levels accepted by `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors reading, writing or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ini::Error> for ConfigError {
    fn from(err: ini::Error) -> Self {
        match err {
            ini::Error::Io(e) => ConfigError::Io(e),
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        }
    }
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    pub streaming_threshold: u64,
    pub large_file_threshold: u64,
    pub chunk_size: usize,
    pub force_streaming: bool,
    pub force_standard: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            streaming_threshold: DEFAULT_STREAMING_THRESHOLD_BYTES,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            force_streaming: false,
            force_standard: false,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[json]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSettings {
    pub fast_backend: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self { fast_backend: true }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub loader: LoaderSettings,
    pub cache: CacheSettings,
    pub json: JsonSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.section(Some(key.section())).and_then(|s| s.get(key.key_name())) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path)?;
        Ok(())
    }

    /// Loader settings as a [`LoaderConfig`].
    pub fn to_loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .with_streaming_threshold(self.loader.streaming_threshold)
            .with_large_file_threshold(self.loader.large_file_threshold)
            .with_chunk_size(self.loader.chunk_size)
            .with_force_streaming(self.loader.force_streaming)
            .with_force_standard(self.loader.force_standard)
            .with_caching(self.cache.enabled)
            .with_fast_json_backend(self.json.fast_backend)
    }
}

/// Directory holding docpivot's configuration.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docpivot")
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

/// A `section.key` setting addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    LoaderStreamingThreshold,
    LoaderLargeFileThreshold,
    LoaderChunkSize,
    LoaderForceStreaming,
    LoaderForceStandard,
    CacheEnabled,
    JsonFastBackend,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LoaderStreamingThreshold,
            ConfigKey::LoaderLargeFileThreshold,
            ConfigKey::LoaderChunkSize,
            ConfigKey::LoaderForceStreaming,
            ConfigKey::LoaderForceStandard,
            ConfigKey::CacheEnabled,
            ConfigKey::JsonFastBackend,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::LoaderStreamingThreshold
            | ConfigKey::LoaderLargeFileThreshold
            | ConfigKey::LoaderChunkSize
            | ConfigKey::LoaderForceStreaming
            | ConfigKey::LoaderForceStandard => "loader",
            ConfigKey::CacheEnabled => "cache",
            ConfigKey::JsonFastBackend => "json",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::LoaderStreamingThreshold => "streaming_threshold",
            ConfigKey::LoaderLargeFileThreshold => "large_file_threshold",
            ConfigKey::LoaderChunkSize => "chunk_size",
            ConfigKey::LoaderForceStreaming => "force_streaming",
            ConfigKey::LoaderForceStandard => "force_standard",
            ConfigKey::CacheEnabled => "enabled",
            ConfigKey::JsonFastBackend => "fast_backend",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as it would be written to the file. Empty means unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LoaderStreamingThreshold => format_size(config.loader.streaming_threshold),
            ConfigKey::LoaderLargeFileThreshold => format_size(config.loader.large_file_threshold),
            ConfigKey::LoaderChunkSize => format_size(config.loader.chunk_size as u64),
            ConfigKey::LoaderForceStreaming => config.loader.force_streaming.to_string(),
            ConfigKey::LoaderForceStandard => config.loader.force_standard.to_string(),
            ConfigKey::CacheEnabled => config.cache.enabled.to_string(),
            ConfigKey::JsonFastBackend => config.json.fast_backend.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::LoaderStreamingThreshold => {
                config.loader.streaming_threshold = self.parse_size(value)?;
            }
            ConfigKey::LoaderLargeFileThreshold => {
                config.loader.large_file_threshold = self.parse_size(value)?;
            }
            ConfigKey::LoaderChunkSize => {
                let size = self.parse_size(value)?;
                config.loader.chunk_size = match usize::try_from(size) {
                    Ok(size) if size > 0 => size,
                    _ => return Err(self.invalid(value)),
                };
            }
            ConfigKey::LoaderForceStreaming => config.loader.force_streaming = self.parse_bool(value)?,
            ConfigKey::LoaderForceStandard => config.loader.force_standard = self.parse_bool(value)?,
            ConfigKey::CacheEnabled => config.cache.enabled = self.parse_bool(value)?,
            ConfigKey::JsonFastBackend => config.json.fast_backend = self.parse_bool(value)?,
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingFile => {
                config.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }

    fn parse_size(&self, value: &str) -> Result<u64, ConfigError> {
        parse_size(value).ok_or_else(|| self.invalid(value))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        parse_bool(value).ok_or_else(|| self.invalid(value))
    }

    fn invalid(&self, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Parse a byte size such as `8192`, `512KB`, `10MB` or `1GB`.
///
/// Units are binary multiples and case-insensitive; a bare `K`/`M`/`G` works
/// too.
pub fn parse_size(input: &str) -> Option<u64> {
    let s = input.trim().to_ascii_uppercase();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let number: u64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return None,
    };
    number.checked_mul(multiplier)
}

/// Render a byte size in the largest unit that divides it exactly.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }
    for (unit, name) in [(GB, "GB"), (MB, "MB"), (KB, "KB")] {
        if bytes % unit == 0 {
            return format!("{}{}", bytes / unit, name);
        }
    }
    bytes.to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
