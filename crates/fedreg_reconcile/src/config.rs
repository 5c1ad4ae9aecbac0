//! Configuration for the reconciler and the stats service.

use std::time::Duration;

/// Provenance tag reconciled when none is given.
pub const DEFAULT_SOURCE: &str = "anthropic";

/// Counter incremented by the number of servers removed in a run.
pub const REMOVED_METRIC: &str = "mcp_federation_reconciliation_removed_total";

/// Histogram of run durations, in seconds.
pub const DURATION_METRIC: &str = "mcp_federation_reconciliation_duration_seconds";

/// Configuration for a [`crate::Reconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Provider name, also the `source` tag of the records it owns.
    pub source: String,
    /// Upper bound for every store and publisher call.
    pub call_timeout: Duration,
    /// Name of the removal counter.
    pub removed_metric: String,
    /// Name of the duration histogram.
    pub duration_metric: String,
}

impl ReconcilerConfig {
    /// Creates a configuration for the given provider source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            call_timeout: Duration::from_secs(30),
            removed_metric: REMOVED_METRIC.to_string(),
            duration_metric: DURATION_METRIC.to_string(),
        }
    }

    /// Sets the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Overrides the metric names.
    pub fn with_metric_names(
        mut self,
        removed: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        self.removed_metric = removed.into();
        self.duration_metric = duration.into();
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

/// Configuration for a [`crate::StatsService`].
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// How long computed stats are served from cache.
    pub ttl: Duration,
    /// Upper bound for the store count call.
    pub call_timeout: Duration,
}

impl StatsConfig {
    /// Creates a configuration with the given cache TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            call_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the store call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
