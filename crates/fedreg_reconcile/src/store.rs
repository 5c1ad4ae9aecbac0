//! Server store abstraction.

use crate::error::StoreResult;
use async_trait::async_trait;
use fedreg_model::{RecordMap, ServerPath, ServerRecord};
use parking_lot::RwLock;

/// Access to the server records mirrored into the registry.
///
/// The reconciler reads through `list_by_source`/`list_all` and deletes
/// through `remove`; it never creates records. Implementations are expected
/// to make single-record deletion atomic.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Lists records whose `source` tag equals `source`.
    async fn list_by_source(&self, source: &str) -> StoreResult<RecordMap>;

    /// Lists every record regardless of source.
    async fn list_all(&self) -> StoreResult<RecordMap>;

    /// Removes a record.
    ///
    /// Returns `Ok(true)` if the record was removed and `Ok(false)` if there
    /// was nothing to remove.
    async fn remove(&self, path: &ServerPath) -> StoreResult<bool>;

    /// Returns the number of records across all sources.
    async fn count(&self) -> StoreResult<usize>;
}

/// An in-memory server store.
///
/// Suitable for tests and for embedding the reconciler in-process.
#[derive(Debug, Default)]
pub struct InMemoryServerStore {
    records: RwLock<RecordMap>,
}

impl InMemoryServerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = ServerRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: ServerRecord) {
        self.records.write().insert(record.path.clone(), record);
    }

    /// Returns a record by path.
    pub fn get(&self, path: &ServerPath) -> Option<ServerRecord> {
        self.records.read().get(path).cloned()
    }

    /// Returns true if a record exists at `path`.
    pub fn contains(&self, path: &ServerPath) -> bool {
        self.records.read().contains_key(path)
    }

    /// Returns a copy of every record.
    pub fn snapshot(&self) -> RecordMap {
        self.records.read().clone()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ServerStore for InMemoryServerStore {
    async fn list_by_source(&self, source: &str) -> StoreResult<RecordMap> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|(_, record)| record.source == source)
            .map(|(path, record)| (path.clone(), record.clone()))
            .collect())
    }

    async fn list_all(&self) -> StoreResult<RecordMap> {
        Ok(self.snapshot())
    }

    async fn remove(&self, path: &ServerPath) -> StoreResult<bool> {
        Ok(self.records.write().remove(path).is_some())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryServerStore {
        InMemoryServerStore::with_records([
            ServerRecord::federated("org/alpha", "anthropic"),
            ServerRecord::federated("org/beta", "anthropic").with_enabled(false),
            ServerRecord::new("/local", "local", "manual"),
        ])
    }

    #[tokio::test]
    async fn list_by_source_filters() {
        let store = store();
        let records = store.list_by_source("anthropic").await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.values().all(|r| r.source == "anthropic"));

        assert_eq!(store.list_by_source("manual").await.unwrap().len(), 1);
        assert!(store.list_by_source("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_all_and_count() {
        let store = store();
        assert_eq!(store.list_all().await.unwrap().len(), 3);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = store();
        let path = ServerPath::from_server_name("org/alpha");

        assert!(store.remove(&path).await.unwrap());
        assert!(!store.contains(&path));
        assert!(!store.remove(&path).await.unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn insert_replaces() {
        let store = InMemoryServerStore::new();
        assert!(store.is_empty());

        store.insert(ServerRecord::new("/x", "first", "anthropic"));
        store.insert(ServerRecord::new("/x", "second", "anthropic"));

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&ServerPath::new("/x")).unwrap().server_name,
            "second"
        );
    }
}
