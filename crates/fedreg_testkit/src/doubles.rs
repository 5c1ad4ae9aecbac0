//! Collaborator doubles with call counting and fault injection.

use async_trait::async_trait;
use fedreg_model::{RecordMap, ServerPath, ServerRecord};
use fedreg_reconcile::{
    InMemoryServerStore, MetricTags, MetricsError, MetricsSink, PublishError,
    RoutingConfigPublisher, ServerStore, StoreError, StoreResult,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A server store wrapping [`InMemoryServerStore`] that counts calls and
/// injects failures.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryServerStore,
    unavailable: AtomicBool,
    list_all_fails: AtomicBool,
    failing_paths: Mutex<HashSet<ServerPath>>,
    refusing_paths: Mutex<HashSet<ServerPath>>,
    slow_paths: Mutex<HashSet<ServerPath>>,
    remove_delay: Mutex<Duration>,
    list_by_source_delay: Mutex<Option<Duration>>,
    list_all_delay: Mutex<Option<Duration>>,
    attempted: Mutex<Vec<ServerPath>>,
    list_by_source_calls: AtomicUsize,
    list_all_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl RecordingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = ServerRecord>) -> Self {
        Self {
            inner: InMemoryServerStore::with_records(records),
            ..Self::default()
        }
    }

    /// Returns the wrapped in-memory store.
    pub fn inner(&self) -> &InMemoryServerStore {
        &self.inner
    }

    /// Makes every read fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes `list_all` fail while `list_by_source` keeps working.
    pub fn fail_list_all(&self, fail: bool) {
        self.list_all_fails.store(fail, Ordering::SeqCst);
    }

    /// Makes removal of `path` fail with a backend error.
    pub fn fail_remove(&self, path: impl Into<ServerPath>) {
        self.failing_paths.lock().insert(path.into());
    }

    /// Makes removal of `path` report "not removed" without an error.
    pub fn refuse_remove(&self, path: impl Into<ServerPath>) {
        self.refusing_paths.lock().insert(path.into());
    }

    /// Delays removal of `path` by `delay`.
    pub fn slow_remove(&self, path: impl Into<ServerPath>, delay: Duration) {
        self.slow_paths.lock().insert(path.into());
        *self.remove_delay.lock() = delay;
    }

    /// Delays every `list_by_source` call by `delay`.
    pub fn slow_list_by_source(&self, delay: Duration) {
        *self.list_by_source_delay.lock() = Some(delay);
    }

    /// Delays every `list_all` call by `delay`.
    pub fn slow_list_all(&self, delay: Duration) {
        *self.list_all_delay.lock() = Some(delay);
    }

    /// Returns every path passed to `remove`, in call order.
    pub fn attempted_removals(&self) -> Vec<ServerPath> {
        self.attempted.lock().clone()
    }

    /// Returns the number of `remove` calls.
    pub fn remove_calls(&self) -> usize {
        self.attempted.lock().len()
    }

    /// Returns the number of `list_by_source` calls.
    pub fn list_by_source_calls(&self) -> usize {
        self.list_by_source_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `list_all` calls.
    pub fn list_all_calls(&self) -> usize {
        self.list_all_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `count` calls.
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }

    async fn pause(delay: &Mutex<Option<Duration>>) {
        let delay = *delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn remove_delay_for(&self, path: &ServerPath) -> Option<Duration> {
        if self.slow_paths.lock().contains(path) {
            Some(*self.remove_delay.lock())
        } else {
            None
        }
    }
}

#[async_trait]
impl ServerStore for RecordingStore {
    async fn list_by_source(&self, source: &str) -> StoreResult<RecordMap> {
        self.list_by_source_calls.fetch_add(1, Ordering::SeqCst);
        Self::pause(&self.list_by_source_delay).await;
        self.check_available()?;
        self.inner.list_by_source(source).await
    }

    async fn list_all(&self) -> StoreResult<RecordMap> {
        self.list_all_calls.fetch_add(1, Ordering::SeqCst);
        Self::pause(&self.list_all_delay).await;
        self.check_available()?;
        if self.list_all_fails.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected list_all failure".into()));
        }
        self.inner.list_all().await
    }

    async fn remove(&self, path: &ServerPath) -> StoreResult<bool> {
        self.attempted.lock().push(path.clone());

        if let Some(delay) = self.remove_delay_for(path) {
            tokio::time::sleep(delay).await;
        }
        if self.failing_paths.lock().contains(path) {
            return Err(StoreError::Backend(format!("injected failure for {path}")));
        }
        if self.refusing_paths.lock().contains(path) {
            return Ok(false);
        }
        self.inner.remove(path).await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.inner.count().await
    }
}

/// A routing config publisher that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    last: Mutex<Option<RecordMap>>,
}

impl RecordingPublisher {
    /// Creates a publisher that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that always fails.
    pub fn failing() -> Self {
        let publisher = Self::new();
        publisher.set_failing(true);
        publisher
    }

    /// Sets whether `publish` fails.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delays every `publish` call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Returns the number of `publish` calls, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the record set of the last successful publish.
    pub fn last_published(&self) -> Option<RecordMap> {
        self.last.lock().clone()
    }
}

#[async_trait]
impl RoutingConfigPublisher for RecordingPublisher {
    async fn publish(&self, enabled: &RecordMap) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError("injected publish failure".into()));
        }
        *self.last.lock() = Some(enabled.clone());
        Ok(())
    }
}

/// A metrics sink that rejects every observation and counts the attempts.
#[derive(Debug, Default)]
pub struct FailingMetrics {
    attempts: AtomicUsize,
}

impl FailingMetrics {
    /// Creates a failing sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many observations were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MetricsSink for FailingMetrics {
    fn add_counter(
        &self,
        _name: &str,
        _value: u64,
        _tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MetricsError("exporter offline".into()))
    }

    fn record_histogram(
        &self,
        _name: &str,
        _value: f64,
        _tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MetricsError("exporter offline".into()))
    }
}
