//! Routing config publisher abstraction.

use crate::error::PublishError;
use async_trait::async_trait;
use fedreg_model::RecordMap;
use parking_lot::RwLock;

/// Regenerates the reverse-proxy routing artifact.
///
/// The reconciler only supplies the input: every enabled record across all
/// sources. Rendering and reloading the proxy are up to the implementation.
#[async_trait]
pub trait RoutingConfigPublisher: Send + Sync {
    /// Publishes routing config for the given enabled records.
    async fn publish(&self, enabled: &RecordMap) -> Result<(), PublishError>;
}

/// A publisher that keeps every published record set in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    published: RwLock<Vec<RecordMap>>,
}

impl MemoryPublisher {
    /// Creates a new memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times `publish` was called.
    pub fn publish_count(&self) -> usize {
        self.published.read().len()
    }

    /// Returns the most recently published record set.
    pub fn last_published(&self) -> Option<RecordMap> {
        self.published.read().last().cloned()
    }
}

#[async_trait]
impl RoutingConfigPublisher for MemoryPublisher {
    async fn publish(&self, enabled: &RecordMap) -> Result<(), PublishError> {
        self.published.write().push(enabled.clone());
        Ok(())
    }
}
