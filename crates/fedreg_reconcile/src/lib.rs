//! # fedreg Reconcile
//!
//! Reconciliation engine for federated servers mirrored into the registry.
//!
//! This crate provides:
//! - A pure diff of declared versus stored servers ([`compute_stale_set`], [`StateDiff`])
//! - Collaborator traits for the store, routing config and metrics
//! - The [`Reconciler`] control loop with dry-run support
//! - [`ReconciliationResult`] and the [`ReconciliationAudit`] record built from it
//! - Registry stats behind an explicit TTL cache
//!
//! ## Architecture
//!
//! A run takes one snapshot of the provider's records, then:
//! 1. Computes the stale set (stored but no longer declared)
//! 2. Removes each stale record independently, in path order
//! 3. Regenerates routing config if anything was removed
//! 4. Records metrics and returns the result
//!
//! ## Key Invariants
//!
//! - Only records whose `source` matches the provider are read or removed
//! - A disabled provider declares nothing, so all its records are stale
//! - Dry runs never mutate the store or publish routing config
//! - One failed removal never aborts the run
//! - Only an unreadable store fails the run as a whole
//!
//! ## Example
//!
//! ```rust
//! use fedreg_model::{FederationConfig, ProviderFederation, ServerRecord};
//! use fedreg_reconcile::{InMemoryServerStore, ReconcileOptions, Reconciler, ReconcilerConfig};
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = Arc::new(InMemoryServerStore::with_records([
//!     ServerRecord::federated("org/alpha", "anthropic"),
//!     ServerRecord::federated("org/gamma", "anthropic"),
//! ]));
//! let federation = FederationConfig::new()
//!     .with_provider("anthropic", ProviderFederation::enabled(["org/alpha"]).unwrap())
//!     .unwrap();
//!
//! let reconciler = Reconciler::new(ReconcilerConfig::new("anthropic"), store.clone());
//! let result = reconciler
//!     .reconcile(&federation, ReconcileOptions::manual_sync("admin"))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.removed, vec!["org/gamma".to_string()]);
//! assert_eq!(store.len(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod diff;
mod error;
mod metrics;
mod publisher;
mod reconciler;
mod result;
mod stats;
mod store;

pub use config::{
    ReconcilerConfig, StatsConfig, DEFAULT_SOURCE, DURATION_METRIC, REMOVED_METRIC,
};
pub use diff::{compute_stale_set, StateDiff};
pub use error::{
    MetricsError, PublishError, ReconcileError, ReconcileResult, StoreError, StoreResult,
};
pub use self::metrics::{
    source_tags, tag_labels, FacadeMetrics, InMemoryMetrics, MetricKind, MetricSample, MetricTags,
    MetricsSink, NoopMetrics,
};
pub use publisher::{MemoryPublisher, RoutingConfigPublisher};
pub use reconciler::{ReconcileOptions, Reconciler};
pub use result::{ReconciliationAudit, ReconciliationResult, SYSTEM_ACTOR};
pub use stats::{CachedValue, RegistryStats, StatsService, TtlCache};
pub use store::{InMemoryServerStore, ServerStore};
