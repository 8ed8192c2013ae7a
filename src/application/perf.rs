//! Performance-measurement sink: a trait seam so the core never reaches for
//! a metrics backend directly, mirroring how the teacher keeps
//! `SessionManager`/`CommandSender` ignorant of the concrete transport.

/// A single timed operation, e.g. a round trip on an outbound request or a
/// router dispatch.
pub trait PerformanceSink: Send + Sync {
    fn record(&self, operation: &str, elapsed_ms: f64);
}

/// Discards every measurement. Used in tests and wherever no sink was
/// configured.
#[derive(Debug, Default)]
pub struct NullPerformanceSink;

impl PerformanceSink for NullPerformanceSink {
    fn record(&self, _operation: &str, _elapsed_ms: f64) {}
}
