//! Pluggable JSON decoding.
//!
//! A [`JsonCodec`] picks the fastest backend compiled into this build once, at
//! construction, and every decode afterwards goes through the same
//! [`JsonBackend`] interface. Nothing downstream knows which backend ran.
//!
//! # Backends
//!
//! | Backend | Feature | Priority |
//! |---------|---------|----------|
//! | [`SimdJsonBackend`] | `simd` | 1 (fastest) |
//! | [`SerdeJsonBackend`] | always | 2 (standard) |

mod backend;

use std::fmt;
use std::sync::Arc;

pub use backend::{DecodeFailure, JsonBackend, SerdeJsonBackend};

#[cfg(feature = "simd")]
pub use backend::SimdJsonBackend;

/// Backend-neutral decoded JSON tree.
pub type ParsedValue = serde_json::Value;

/// Selected JSON backend, shared cheaply between loaders.
#[derive(Clone)]
pub struct JsonCodec {
    backend: Arc<dyn JsonBackend>,
}

impl JsonCodec {
    /// Probe compiled-in backends in priority order.
    ///
    /// With `use_fast` false the standard backend is used unconditionally.
    pub fn select(use_fast: bool) -> Self {
        let codec = if use_fast {
            Self::fastest_available()
        } else {
            Self::standard()
        };
        tracing::debug!(backend = codec.name(), use_fast, "Selected JSON backend");
        codec
    }

    /// The standard `serde_json` backend.
    pub fn standard() -> Self {
        Self::with_backend(Arc::new(SerdeJsonBackend))
    }

    /// Use an explicit backend.
    pub fn with_backend(backend: Arc<dyn JsonBackend>) -> Self {
        Self { backend }
    }

    #[cfg(feature = "simd")]
    fn fastest_available() -> Self {
        Self::with_backend(Arc::new(SimdJsonBackend))
    }

    #[cfg(not(feature = "simd"))]
    fn fastest_available() -> Self {
        Self::standard()
    }

    /// Name of the active backend.
    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Decode UTF-8 JSON bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<ParsedValue, DecodeFailure> {
        self.backend.decode(bytes)
    }

    /// Encode a value back to compact JSON.
    pub fn encode(&self, value: &ParsedValue) -> Result<Vec<u8>, DecodeFailure> {
        self.backend.encode(value)
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::select(true)
    }
}

impl fmt::Debug for JsonCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("backend", &self.name())
            .finish()
    }
}
