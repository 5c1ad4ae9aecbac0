//! Stored server records.

use crate::path::ServerPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records keyed by path. Ordered so iteration is deterministic.
pub type RecordMap = BTreeMap<ServerPath, ServerRecord>;

/// A server entry held by the server store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Primary key.
    pub path: ServerPath,
    /// Display name. May be empty for records written by older syncs.
    #[serde(default)]
    pub server_name: String,
    /// Provenance tag, usually the federation provider name.
    #[serde(default)]
    pub source: String,
    /// Whether the server is routed by the proxy layer.
    #[serde(default)]
    pub is_enabled: bool,
}

impl ServerRecord {
    /// Creates an enabled record.
    pub fn new(
        path: impl Into<ServerPath>,
        server_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            server_name: server_name.into(),
            source: source.into(),
            is_enabled: true,
        }
    }

    /// Creates an enabled record for a federated server, deriving the path
    /// from its declared name.
    pub fn federated(server_name: &str, source: impl Into<String>) -> Self {
        Self::new(ServerPath::from_server_name(server_name), server_name, source)
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    /// Returns the name to show for this record, falling back to the path.
    pub fn display_name(&self) -> &str {
        if self.server_name.is_empty() {
            self.path.as_str()
        } else {
            &self.server_name
        }
    }
}
