//! Synchronous progress reporting.
//!
//! Progress is reported at fixed checkpoints on the loading thread. There is
//! no observer thread.

use std::fmt;
use std::sync::Arc;

/// Callback receiving progress fractions in `[0.0, 1.0]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Per-call wrapper that keeps reported values monotonic.
///
/// Values are clamped into `[0, 1]` and anything below the last reported
/// value is dropped, so a sink never sees progress go backwards.
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
    last: f64,
}

impl ProgressReporter {
    pub fn new(sink: Option<ProgressSink>) -> Self {
        Self { sink, last: 0.0 }
    }

    /// A reporter that discards everything.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Report a fraction.
    pub fn report(&mut self, fraction: f64) {
        let Some(sink) = &self.sink else {
            return;
        };
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction < self.last {
            return;
        }
        self.last = fraction;
        sink(fraction);
    }

    /// Report completion (exactly `1.0`).
    pub fn finish(&mut self) {
        self.report(1.0);
    }

    /// Last value passed to the sink.
    pub fn last(&self) -> f64 {
        self.last
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_sink", &self.sink.is_some())
            .field("last", &self.last)
            .finish()
    }
}
