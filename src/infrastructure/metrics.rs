//! Metrics sink emitting through the `tracing` ecosystem.
//!
//! Counters and gauges become structured events under a dedicated target,
//! where a subscriber can forward them to whatever metrics backend is in
//! use. Tags are flattened into a single `key:value` comma-separated
//! field to keep cardinality visible in plain log output too.

use crate::application::ports::MetricsSink;

/// Target under which metric events are emitted.
pub const METRICS_TARGET: &str = "submission_throttle::metrics";

/// Emits counters and gauges as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsSink;

impl TracingMetricsSink {
    /// Create a new tracing-backed sink.
    pub fn new() -> Self {
        Self
    }
}

fn format_tags(tags: &[(&str, &str)]) -> String {
    tags.iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

impl MetricsSink for TracingMetricsSink {
    fn counter(&self, name: &str, value: u64, tags: &[(&str, &str)]) {
        tracing::info!(
            target: METRICS_TARGET,
            metric = name,
            kind = "counter",
            value,
            tags = %format_tags(tags),
        );
    }

    fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        tracing::info!(
            target: METRICS_TARGET,
            metric = name,
            kind = "gauge",
            value,
            tags = %format_tags(tags),
        );
    }
}
