//! Fixtures for federation configs, stores and a wired reconciler.

use crate::doubles::{RecordingPublisher, RecordingStore};
use fedreg_model::{FederationConfig, ProviderFederation, ServerRecord};
use fedreg_reconcile::{InMemoryMetrics, Reconciler, ReconcilerConfig, DEFAULT_SOURCE};
use std::sync::Arc;
use std::time::Duration;

/// An enabled federation config for the default source.
pub fn federation(names: &[&str]) -> FederationConfig {
    federation_for(DEFAULT_SOURCE, true, names)
}

/// A disabled federation config for the default source that still lists
/// `names`.
pub fn disabled_federation(names: &[&str]) -> FederationConfig {
    federation_for(DEFAULT_SOURCE, false, names)
}

/// A federation config with one provider section.
pub fn federation_for(source: &str, enabled: bool, names: &[&str]) -> FederationConfig {
    let mut provider =
        ProviderFederation::enabled(names.iter().copied()).expect("Invalid server name");
    provider.enabled = enabled;
    FederationConfig::new()
        .with_provider(source, provider)
        .expect("Invalid provider name")
}

/// Federated records for `names` tagged with `source`.
pub fn records_for(source: &str, names: &[&str]) -> Vec<ServerRecord> {
    names
        .iter()
        .map(|name| ServerRecord::federated(name, source))
        .collect()
}

/// A reconciler wired to recording doubles.
pub struct Harness {
    /// The store double.
    pub store: Arc<RecordingStore>,
    /// The publisher double.
    pub publisher: Arc<RecordingPublisher>,
    /// The metrics sink.
    pub metrics: Arc<InMemoryMetrics>,
    /// The reconciler under test.
    pub reconciler: Reconciler,
}

impl Harness {
    /// Creates a harness whose store holds federated records for `names`
    /// under the default source.
    pub fn seeded(names: &[&str]) -> Self {
        Self::with_records(records_for(DEFAULT_SOURCE, names))
    }

    /// Creates a harness whose store holds `records`.
    pub fn with_records(records: impl IntoIterator<Item = ServerRecord>) -> Self {
        Self::build(RecordingStore::with_records(records), ReconcilerConfig::default())
    }

    /// Rebuilds the harness with a different per-call timeout, keeping the
    /// store contents.
    pub fn with_call_timeout(self, timeout: Duration) -> Self {
        let config = ReconcilerConfig::default().with_call_timeout(timeout);
        let store = RecordingStore::with_records(self.store.inner().snapshot().into_values());
        Self::build(store, config)
    }

    fn build(store: RecordingStore, config: ReconcilerConfig) -> Self {
        let store = Arc::new(store);
        let publisher = Arc::new(RecordingPublisher::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let reconciler = Reconciler::new(config, store.clone())
            .with_publisher(publisher.clone())
            .with_metrics(metrics.clone());
        Self {
            store,
            publisher,
            metrics,
            reconciler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn federation_fixtures() {
        let config = federation(&["org/alpha"]);
        assert!(config.is_enabled(DEFAULT_SOURCE));
        assert_eq!(config.expected_paths(DEFAULT_SOURCE).len(), 1);

        let config = disabled_federation(&["org/alpha"]);
        assert!(!config.is_enabled(DEFAULT_SOURCE));
        assert_eq!(config.provider(DEFAULT_SOURCE).unwrap().servers.len(), 1);
    }

    #[test]
    fn seeded_harness() {
        let harness = Harness::seeded(&["a", "b"]);
        assert_eq!(harness.store.inner().len(), 2);
        assert_eq!(harness.reconciler.source(), DEFAULT_SOURCE);

        let harness = harness.with_call_timeout(Duration::from_millis(5));
        assert_eq!(harness.store.inner().len(), 2);
        assert_eq!(
            harness.reconciler.config().call_timeout,
            Duration::from_millis(5)
        );
    }
}
