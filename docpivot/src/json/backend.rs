//! JSON backend implementations.

use std::fmt;

use super::ParsedValue;

/// A failed decode or encode, with position info when the backend has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Byte offset into the input.
    pub offset: Option<u64>,
    /// 1-based line number.
    pub line: Option<usize>,
    /// 1-based column number.
    pub column: Option<usize>,
    /// Backend message.
    pub message: String,
}

impl DecodeFailure {
    /// A failure with no position info.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            offset: None,
            line: None,
            column: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} (line {}, column {})", self.message, line, column)
            }
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DecodeFailure {}

/// A JSON decode/encode implementation.
pub trait JsonBackend: Send + Sync {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    /// Decode a complete JSON document.
    fn decode(&self, bytes: &[u8]) -> Result<ParsedValue, DecodeFailure>;

    /// Encode a value as compact JSON.
    fn encode(&self, value: &ParsedValue) -> Result<Vec<u8>, DecodeFailure>;
}

/// The standard decoder, backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonBackend;

impl JsonBackend for SerdeJsonBackend {
    fn name(&self) -> &'static str {
        "serde_json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<ParsedValue, DecodeFailure> {
        serde_json::from_slice(bytes).map_err(|e| {
            let (line, column) = (e.line(), e.column());
            DecodeFailure {
                offset: byte_offset(bytes, line, column),
                line: Some(line),
                column: Some(column),
                message: strip_position(&e),
            }
        })
    }

    fn encode(&self, value: &ParsedValue) -> Result<Vec<u8>, DecodeFailure> {
        serde_json::to_vec(value).map_err(|e| DecodeFailure::message(e.to_string()))
    }
}

/// serde_json appends " at line X column Y" to its messages; position is
/// carried in dedicated fields instead.
fn strip_position(err: &serde_json::Error) -> String {
    let message = err.to_string();
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message,
    }
}

/// Convert serde_json's 1-based line/column into a byte offset.
///
/// serde_json reports line 0 when the error has no position.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> Option<u64> {
    if line == 0 {
        return None;
    }

    let mut line_start = 0usize;
    for _ in 1..line {
        let newline = bytes[line_start..].iter().position(|&b| b == b'\n')?;
        line_start += newline + 1;
    }

    let offset = line_start + column.saturating_sub(1);
    Some(offset.min(bytes.len()) as u64)
}

/// SIMD-accelerated decoder, backed by `simd-json`.
///
/// simd-json parses in place, so the input is copied into a scratch buffer.
#[cfg(feature = "simd")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SimdJsonBackend;

#[cfg(feature = "simd")]
impl JsonBackend for SimdJsonBackend {
    fn name(&self) -> &'static str {
        "simd-json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<ParsedValue, DecodeFailure> {
        let mut scratch = bytes.to_vec();
        simd_json::serde::from_slice::<ParsedValue>(&mut scratch).map_err(|e| {
            let message = e.to_string();
            let message = match message.rfind(" at character ") {
                Some(idx) => message[..idx].to_string(),
                None => message,
            };
            DecodeFailure {
                offset: Some((e.index() as u64).min(bytes.len() as u64)),
                line: None,
                column: None,
                message,
            }
        })
    }

    fn encode(&self, value: &ParsedValue) -> Result<Vec<u8>, DecodeFailure> {
        simd_json::serde::to_vec(value).map_err(|e| DecodeFailure::message(e.to_string()))
    }
}
