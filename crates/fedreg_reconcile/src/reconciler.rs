//! Reconciliation orchestrator.

use crate::config::ReconcilerConfig;
use crate::diff::{display_name, StateDiff};
use crate::error::{ReconcileError, ReconcileResult, StoreError};
use crate::metrics::{source_tags, FacadeMetrics, MetricsSink};
use crate::publisher::RoutingConfigPublisher;
use crate::result::{ReconciliationResult, SYSTEM_ACTOR};
use crate::store::ServerStore;
use fedreg_model::{FederationConfig, RecordMap, ServerPath};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Per-run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compute and report the change set without mutating anything.
    pub dry_run: bool,
    /// Skip routing config regeneration even if servers were removed.
    pub skip_config_regen: bool,
    /// Identity of whoever triggered the run. `None` means system-triggered.
    pub actor: Option<String>,
}

impl ReconcileOptions {
    /// Options for a run triggered by saving the federation config.
    pub fn config_save(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
            ..Self::default()
        }
    }

    /// Options for an admin-triggered manual sync.
    pub fn manual_sync(actor: impl Into<String>) -> Self {
        Self::config_save(actor)
    }

    /// Options for a dry run.
    pub fn dry_run(actor: Option<String>) -> Self {
        Self {
            dry_run: true,
            actor,
            ..Self::default()
        }
    }

    /// Options for the startup run.
    ///
    /// Routing config is regenerated separately during startup, so the run
    /// skips it.
    pub fn startup() -> Self {
        Self {
            skip_config_regen: true,
            ..Self::default()
        }
    }

    /// Returns the actor, or [`SYSTEM_ACTOR`].
    pub fn triggered_by(&self) -> &str {
        self.actor.as_deref().unwrap_or(SYSTEM_ACTOR)
    }
}

/// Prunes stored records of one federation provider that its config no
/// longer declares.
///
/// A run reads one snapshot of the provider's records, removes every stale
/// record independently (one failure never stops the others), regenerates
/// routing config when something was removed, and reports metrics.
///
/// Overlapping runs are safe: removing a record that is already gone is
/// reported as an itemized error, never as a failed run. Callers may still
/// serialize runs per provider to avoid the duplicate work.
pub struct Reconciler {
    config: ReconcilerConfig,
    store: Arc<dyn ServerStore>,
    publisher: Option<Arc<dyn RoutingConfigPublisher>>,
    metrics: Arc<dyn MetricsSink>,
}

impl Reconciler {
    /// Creates a reconciler without a publisher, reporting metrics through
    /// [`FacadeMetrics`].
    pub fn new(config: ReconcilerConfig, store: Arc<dyn ServerStore>) -> Self {
        let metrics = Arc::new(FacadeMetrics::for_config(&config));
        Self {
            config,
            store,
            publisher: None,
            metrics,
        }
    }

    /// Sets the routing config publisher.
    pub fn with_publisher(mut self, publisher: Arc<dyn RoutingConfigPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Sets the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Returns the provider source this reconciler owns.
    pub fn source(&self) -> &str {
        &self.config.source
    }

    /// Reconciles the provider's stored records against `federation`.
    ///
    /// # Errors
    ///
    /// Fails only if the provider's records cannot be read. Removal failures
    /// are reported in [`ReconciliationResult::errors`]; regeneration and
    /// metrics failures are logged.
    pub async fn reconcile(
        &self,
        federation: &FederationConfig,
        options: ReconcileOptions,
    ) -> ReconcileResult<ReconciliationResult> {
        let start = Instant::now();
        let source = self.source();

        if federation.is_enabled(source) {
            for collision in federation.path_collisions(source) {
                warn!(
                    source,
                    path = %collision.path,
                    names = ?collision.names,
                    "reconciliation: declared servers share a storage path"
                );
            }
        }

        let actual = self.fetch_actual(source).await?;
        let diff = StateDiff::compute(federation, source, &actual);
        info!(
            source,
            expected = diff.expected.len(),
            actual = diff.actual_count,
            "reconciliation: loaded declared and stored servers"
        );

        if diff.is_converged() {
            debug!(source, "reconciliation: no stale servers found");
            return Ok(ReconciliationResult::converged(
                diff.expected.len(),
                diff.actual_count,
                options.dry_run,
            ));
        }

        let stale_names = diff.stale_names(&actual);
        info!(
            source,
            stale = diff.stale.len(),
            servers = ?stale_names,
            "reconciliation: stale servers to remove"
        );

        if options.dry_run {
            info!(source, "reconciliation: dry run, skipping removal");
            return Ok(ReconciliationResult::new(
                stale_names,
                diff.expected.len(),
                diff.actual_count,
                true,
                Vec::new(),
            ));
        }

        let (removed, errors) = self.remove_stale(&diff.stale, &actual).await;

        if !removed.is_empty() && !options.skip_config_regen {
            if let Some(publisher) = &self.publisher {
                match self.regenerate_routing_config(publisher.as_ref()).await {
                    Ok(enabled) => {
                        info!(source, enabled, "reconciliation: routing config regenerated")
                    }
                    Err(e) => {
                        error!(
                            source,
                            error = %e,
                            "reconciliation: failed to regenerate routing config"
                        )
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        self.record_metrics(removed.len(), elapsed);

        info!(
            source,
            triggered_by = options.triggered_by(),
            removed = removed.len(),
            expected = diff.expected.len(),
            actual = diff.actual_count,
            stale = diff.stale.len(),
            errors = errors.len(),
            elapsed_secs = elapsed.as_secs_f64(),
            "reconciliation complete"
        );

        Ok(ReconciliationResult::new(
            removed,
            diff.expected.len(),
            diff.actual_count,
            false,
            errors,
        ))
    }

    /// Reads the single snapshot of the provider's records for this run.
    async fn fetch_actual(&self, source: &str) -> ReconcileResult<RecordMap> {
        match self
            .bounded("list_by_source", self.store.list_by_source(source))
            .await
        {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => {
                error!(source, error = %e, "reconciliation: cannot read stored servers");
                Err(ReconcileError::Store(e))
            }
            Err(e) => {
                error!(source, error = %e, "reconciliation: cannot read stored servers");
                Err(e)
            }
        }
    }

    /// Removes stale records in path order. Returns removed display names and
    /// itemized failures.
    async fn remove_stale(
        &self,
        stale: &BTreeSet<ServerPath>,
        actual: &RecordMap,
    ) -> (Vec<String>, Vec<String>) {
        let mut removed = Vec::new();
        let mut errors = Vec::new();

        for path in stale {
            let name = display_name(actual, path);
            match self.bounded("remove", self.store.remove(path)).await {
                Ok(Ok(true)) => {
                    info!(server = %name, %path, "reconciliation: removed stale server");
                    removed.push(name);
                }
                Ok(Ok(false)) | Ok(Err(StoreError::NotFound(_))) => {
                    warn!(server = %name, %path, "reconciliation: failed to remove server");
                    errors.push(format!("Failed to remove {name} ({path})"));
                }
                Ok(Err(e)) => {
                    error!(
                        server = %name,
                        %path,
                        error = %e,
                        "reconciliation: error removing server"
                    );
                    errors.push(format!("Error removing {path}: {e}"));
                }
                Err(e) => {
                    error!(
                        server = %name,
                        %path,
                        error = %e,
                        "reconciliation: error removing server"
                    );
                    errors.push(format!("Error removing {path}: {e}"));
                }
            }
        }

        (removed, errors)
    }

    /// Publishes routing config for every enabled record. Returns the number
    /// of enabled records published.
    async fn regenerate_routing_config(
        &self,
        publisher: &dyn RoutingConfigPublisher,
    ) -> ReconcileResult<usize> {
        let all = self.bounded("list_all", self.store.list_all()).await??;
        let enabled: RecordMap = all
            .into_iter()
            .filter(|(_, record)| record.is_enabled)
            .collect();

        self.bounded("publish", publisher.publish(&enabled)).await??;
        Ok(enabled.len())
    }

    fn record_metrics(&self, removed: usize, elapsed: Duration) {
        let tags = source_tags(self.source());

        if let Err(e) = self
            .metrics
            .add_counter(&self.config.removed_metric, removed as u64, &tags)
        {
            debug!(error = %e, "failed to record reconciliation metrics");
        }
        if let Err(e) =
            self.metrics
                .record_histogram(&self.config.duration_metric, elapsed.as_secs_f64(), &tags)
        {
            debug!(error = %e, "failed to record reconciliation metrics");
        }
    }

    /// Runs a collaborator call under the configured timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = T>,
    ) -> ReconcileResult<T> {
        let timeout = self.config.call_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ReconcileError::Timeout { operation, timeout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::InMemoryMetrics;
    use crate::publisher::MemoryPublisher;
    use crate::store::InMemoryServerStore;
    use fedreg_model::{ProviderFederation, ServerRecord};

    fn federation(enabled: bool, names: &[&str]) -> FederationConfig {
        let mut provider = ProviderFederation::enabled(names.iter().copied()).unwrap();
        provider.enabled = enabled;
        FederationConfig::new()
            .with_provider("anthropic", provider)
            .unwrap()
    }

    fn setup(
        names: &[&str],
    ) -> (
        Arc<InMemoryServerStore>,
        Arc<MemoryPublisher>,
        Arc<InMemoryMetrics>,
        Reconciler,
    ) {
        let store = Arc::new(InMemoryServerStore::with_records(
            names
                .iter()
                .map(|name| ServerRecord::federated(name, "anthropic")),
        ));
        let publisher = Arc::new(MemoryPublisher::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let reconciler = Reconciler::new(ReconcilerConfig::default(), store.clone())
            .with_publisher(publisher.clone())
            .with_metrics(metrics.clone());
        (store, publisher, metrics, reconciler)
    }

    #[test]
    fn options_constructors() {
        let startup = ReconcileOptions::startup();
        assert!(startup.skip_config_regen);
        assert!(!startup.dry_run);
        assert_eq!(startup.triggered_by(), "system");

        let manual = ReconcileOptions::manual_sync("admin");
        assert_eq!(manual.triggered_by(), "admin");
        assert!(!manual.skip_config_regen);

        assert!(ReconcileOptions::dry_run(None).dry_run);
    }

    #[tokio::test]
    async fn removes_undeclared_server() {
        let (store, publisher, metrics, reconciler) =
            setup(&["org/alpha", "org/beta", "org/gamma"]);

        let result = reconciler
            .reconcile(
                &federation(true, &["org/alpha", "org/beta"]),
                ReconcileOptions::config_save("admin"),
            )
            .await
            .unwrap();

        assert_eq!(result.removed, vec!["org/gamma".to_string()]);
        assert_eq!(result.removed_count, 1);
        assert_eq!(result.expected_count, 2);
        assert_eq!(result.actual_count, 3);
        assert!(!result.dry_run);
        assert!(result.errors.is_empty());

        assert_eq!(store.len(), 2);
        assert_eq!(publisher.publish_count(), 1);
        assert_eq!(publisher.last_published().unwrap().len(), 2);
        assert_eq!(metrics.counter_total(crate::config::REMOVED_METRIC), 1);
        assert_eq!(
            metrics.histogram_values(crate::config::DURATION_METRIC).len(),
            1
        );
    }

    #[tokio::test]
    async fn converged_run_has_no_side_effects() {
        let (store, publisher, metrics, reconciler) = setup(&["org/alpha"]);

        let result = reconciler
            .reconcile(&federation(true, &["org/alpha"]), ReconcileOptions::default())
            .await
            .unwrap();

        assert!(result.is_clean());
        assert_eq!(result.expected_count, 1);
        assert_eq!(result.actual_count, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(publisher.publish_count(), 0);
        assert!(metrics.samples().is_empty());
    }

    #[tokio::test]
    async fn dry_run_reports_without_mutating() {
        let (store, publisher, _, reconciler) = setup(&["x"]);

        let result = reconciler
            .reconcile(&federation(false, &[]), ReconcileOptions::dry_run(None))
            .await
            .unwrap();

        assert!(result.dry_run);
        assert_eq!(result.removed, vec!["x".to_string()]);
        assert_eq!(result.removed_count, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(publisher.publish_count(), 0);
    }

    #[tokio::test]
    async fn skip_config_regen_still_removes() {
        let (store, publisher, _, reconciler) = setup(&["x"]);

        let result = reconciler
            .reconcile(&federation(false, &[]), ReconcileOptions::startup())
            .await
            .unwrap();

        assert_eq!(result.removed_count, 1);
        assert!(store.is_empty());
        assert_eq!(publisher.publish_count(), 0);
    }

    #[tokio::test]
    async fn other_sources_are_untouched() {
        let (store, _, _, reconciler) = setup(&["x"]);
        store.insert(ServerRecord::new("/manual", "manual", "local"));

        let result = reconciler
            .reconcile(&FederationConfig::new(), ReconcileOptions::default())
            .await
            .unwrap();

        assert_eq!(result.actual_count, 1);
        assert_eq!(result.removed, vec!["x".to_string()]);
        assert!(store.contains(&ServerPath::new("/manual")));
    }

    #[tokio::test]
    async fn published_set_only_contains_enabled_records() {
        let (store, publisher, _, reconciler) = setup(&["x"]);
        store.insert(ServerRecord::new("/on", "on", "local"));
        store.insert(ServerRecord::new("/off", "off", "local").with_enabled(false));

        reconciler
            .reconcile(&FederationConfig::new(), ReconcileOptions::default())
            .await
            .unwrap();

        let published = publisher.last_published().unwrap();
        assert_eq!(published.len(), 1);
        assert!(published.contains_key(&ServerPath::new("/on")));
    }
}
