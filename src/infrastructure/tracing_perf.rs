//! `PerformanceSink` implementation that just logs through `tracing`, the
//! way the teacher reports timings without a dedicated metrics backend.

use crate::application::perf::PerformanceSink;

pub struct TracingPerformanceSink;

impl PerformanceSink for TracingPerformanceSink {
    fn record(&self, operation: &str, elapsed_ms: f64) {
        tracing::debug!(operation, elapsed_ms, "timed operation");
    }
}
