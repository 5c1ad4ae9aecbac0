//! Server path identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage identifier of a server record.
///
/// Paths are the primary key of the server store. Paths for federated
/// servers are derived from the declared name with [`ServerPath::from_server_name`];
/// paths read back from storage are wrapped as-is with [`ServerPath::new`].
///
/// # Collisions
///
/// The name mapping is not injective: `"a/b"` and `"a-b"` both map to `"/a-b"`.
/// Use [`crate::FederationConfig::path_collisions`] to detect this in a
/// declared server list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerPath(String);

impl ServerPath {
    /// Wraps an existing storage path without transforming it.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Maps a declared server name to its storage path.
    ///
    /// Every `/` in the name is replaced with `-` and the result is prefixed
    /// with `/`, so `"io.github.acme/websearch"` becomes
    /// `"/io.github.acme-websearch"`.
    pub fn from_server_name(name: &str) -> Self {
        Self(format!("/{}", name.replace('/', "-")))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ServerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServerPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServerPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ServerPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}
