//! Metrics recorder for testing.

use crate::application::ports::MetricsSink;
use std::sync::{Arc, Mutex};

/// One recorded counter or gauge emission.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMetric {
    /// Metric name.
    pub name: String,
    /// Counter increment or gauge value.
    pub value: f64,
    /// Tags as (key, value) pairs, in emission order.
    pub tags: Vec<(String, String)>,
}

/// Captures every emitted metric for assertions.
///
/// Clones share the same underlying recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingMetricsSink {
    counters: Arc<Mutex<Vec<RecordedMetric>>>,
    gauges: Arc<Mutex<Vec<RecordedMetric>>>,
}

impl RecordingMetricsSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded counter emissions, in order.
    pub fn counters(&self) -> Vec<RecordedMetric> {
        self.counters.lock().expect("recorder mutex poisoned").clone()
    }

    /// All recorded gauge emissions, in order.
    pub fn gauges(&self) -> Vec<RecordedMetric> {
        self.gauges.lock().expect("recorder mutex poisoned").clone()
    }

    /// Sum of increments for a counter name.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters()
            .iter()
            .filter(|m| m.name == name)
            .map(|m| m.value as u64)
            .sum()
    }

    /// Gauge emissions for a name.
    pub fn gauges_named(&self, name: &str) -> Vec<RecordedMetric> {
        self.gauges()
            .into_iter()
            .filter(|m| m.name == name)
            .collect()
    }
}

fn record(store: &Mutex<Vec<RecordedMetric>>, name: &str, value: f64, tags: &[(&str, &str)]) {
    store.lock().expect("recorder mutex poisoned").push(RecordedMetric {
        name: name.to_string(),
        value,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    });
}

impl MetricsSink for RecordingMetricsSink {
    fn counter(&self, name: &str, value: u64, tags: &[(&str, &str)]) {
        record(&self.counters, name, value as f64, tags);
    }

    fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        record(&self.gauges, name, value, tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_counters_and_gauges() {
        let sink = RecordingMetricsSink::new();
        sink.counter("submissions.rate_limited", 1, &[("tenant", "acme")]);
        sink.counter("submissions.rate_limited", 1, &[("tenant", "acme")]);
        sink.gauge("submissions.global_usage", 7.0, &[("window", "minute")]);

        assert_eq!(sink.counter_total("submissions.rate_limited"), 2);
        assert_eq!(sink.counters()[0].tags, vec![("tenant".to_string(), "acme".to_string())]);

        let gauges = sink.gauges_named("submissions.global_usage");
        assert_eq!(gauges.len(), 1);
        assert_eq!(gauges[0].value, 7.0);
    }

    #[test]
    fn test_clones_share_recording() {
        let sink = RecordingMetricsSink::new();
        sink.clone().counter("submissions.rate_limited", 1, &[]);
        assert_eq!(sink.counter_total("submissions.rate_limited"), 1);
    }
}
