//! Metrics sink abstraction.
//!
//! Recording is best-effort. The orchestrator logs a failed call at debug
//! level and carries on; metrics never change the outcome of a run.
//!
//! [`FacadeMetrics`] forwards to the `metrics` crate, so whatever recorder
//! the host process installs (a Prometheus exporter, for instance) receives
//! the reconciliation counter and histogram.

use crate::config::ReconcilerConfig;
use crate::error::MetricsError;
use ::metrics::{describe_counter, describe_histogram, Label, Unit};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Tags attached to a metric observation.
pub type MetricTags = BTreeMap<String, String>;

/// Builds a tag set with a single `source` tag.
pub fn source_tags(source: &str) -> MetricTags {
    let mut tags = MetricTags::new();
    tags.insert("source".to_string(), source.to_string());
    tags
}

/// Receives counters and histogram observations.
pub trait MetricsSink: Send + Sync {
    /// Adds `value` to a counter.
    fn add_counter(&self, name: &str, value: u64, tags: &MetricTags) -> Result<(), MetricsError>;

    /// Records a histogram observation.
    fn record_histogram(&self, name: &str, value: f64, tags: &MetricTags)
        -> Result<(), MetricsError>;
}

/// A sink backed by the process-wide `metrics` recorder.
///
/// Tags become labels. With no recorder installed the facade drops every
/// observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeMetrics;

impl FacadeMetrics {
    /// Creates a facade sink and registers descriptions for the metric names
    /// in `config`.
    pub fn for_config(config: &ReconcilerConfig) -> Self {
        describe_counter!(
            config.removed_metric.clone(),
            "Federated servers removed by reconciliation"
        );
        describe_histogram!(
            config.duration_metric.clone(),
            Unit::Seconds,
            "Duration of federation reconciliation runs"
        );
        Self
    }
}

/// Converts tags into `metrics` labels.
pub fn tag_labels(tags: &MetricTags) -> Vec<Label> {
    tags.iter()
        .map(|(key, value)| Label::new(key.clone(), value.clone()))
        .collect()
}

impl MetricsSink for FacadeMetrics {
    fn add_counter(&self, name: &str, value: u64, tags: &MetricTags) -> Result<(), MetricsError> {
        ::metrics::counter!(name.to_string(), value, tag_labels(tags));
        Ok(())
    }

    fn record_histogram(
        &self,
        name: &str,
        value: f64,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        ::metrics::histogram!(name.to_string(), value, tag_labels(tags));
        Ok(())
    }
}

/// A sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn add_counter(
        &self,
        _name: &str,
        _value: u64,
        _tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        Ok(())
    }

    fn record_histogram(
        &self,
        _name: &str,
        _value: f64,
        _tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// Kind of a recorded observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Counter increment.
    Counter,
    /// Histogram observation.
    Histogram,
}

/// One recorded observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Observation kind.
    pub kind: MetricKind,
    /// Metric name.
    pub name: String,
    /// Observed value.
    pub value: f64,
    /// Tags.
    pub tags: MetricTags,
}

/// A sink that keeps every observation in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    samples: Mutex<Vec<MetricSample>>,
}

impl InMemoryMetrics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded observation, oldest first.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().clone()
    }

    /// Returns the sum of all increments of a counter.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.kind == MetricKind::Counter && s.name == name)
            .map(|s| s.value as u64)
            .sum()
    }

    /// Returns the observations of a histogram.
    pub fn histogram_values(&self, name: &str) -> Vec<f64> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.kind == MetricKind::Histogram && s.name == name)
            .map(|s| s.value)
            .collect()
    }

    fn push(&self, kind: MetricKind, name: &str, value: f64, tags: &MetricTags) {
        self.samples.lock().push(MetricSample {
            kind,
            name: name.to_string(),
            value,
            tags: tags.clone(),
        });
    }
}

impl MetricsSink for InMemoryMetrics {
    fn add_counter(&self, name: &str, value: u64, tags: &MetricTags) -> Result<(), MetricsError> {
        self.push(MetricKind::Counter, name, value as f64, tags);
        Ok(())
    }

    fn record_histogram(
        &self,
        name: &str,
        value: f64,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        self.push(MetricKind::Histogram, name, value, tags);
        Ok(())
    }
}
