//! Declared federation state.

use crate::error::{ModelError, ModelResult};
use crate::path::ServerPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A server declared by a federation provider.
///
/// Deserialization goes through [`DeclaredServer::new`], so an empty name is
/// rejected when the config is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDeclaredServer")]
pub struct DeclaredServer {
    /// Upstream server name, e.g. `"io.github.acme/websearch"`.
    pub name: String,
}

#[derive(Deserialize)]
struct RawDeclaredServer {
    name: String,
}

impl TryFrom<RawDeclaredServer> for DeclaredServer {
    type Error = ModelError;

    fn try_from(raw: RawDeclaredServer) -> ModelResult<Self> {
        Self::new(raw.name)
    }
}

impl DeclaredServer {
    /// Creates a declared server, rejecting empty names.
    pub fn new(name: impl Into<String>) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyServerName);
        }
        Ok(Self { name })
    }

    /// Returns the storage path this server is mirrored under.
    pub fn path(&self) -> ServerPath {
        ServerPath::from_server_name(&self.name)
    }
}

/// Federation settings for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFederation {
    /// Whether federation with this provider is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Declared servers, in the order the provider lists them.
    #[serde(default)]
    pub servers: Vec<DeclaredServer>,
}

impl ProviderFederation {
    /// Creates an enabled provider declaring the given server names.
    pub fn enabled<I, S>(names: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let servers = names
            .into_iter()
            .map(DeclaredServer::new)
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Self {
            enabled: true,
            servers,
        })
    }

    /// Creates a disabled provider with no declared servers.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns the mapped paths of every declared server, ignoring `enabled`.
    pub fn declared_paths(&self) -> BTreeSet<ServerPath> {
        self.servers.iter().map(DeclaredServer::path).collect()
    }

    /// Returns the paths expected in the store: the declared paths when
    /// enabled, otherwise nothing.
    pub fn expected_paths(&self) -> BTreeSet<ServerPath> {
        if self.enabled {
            self.declared_paths()
        } else {
            BTreeSet::new()
        }
    }
}

/// A set of distinct declared names that map to the same storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCollision {
    /// The shared path.
    pub path: ServerPath,
    /// The colliding names, in declaration order.
    pub names: Vec<String>,
}

/// Declared federation state, keyed by provider name.
///
/// Deserializes from `{"<provider>": {"enabled": bool, "servers": [{"name": ...}]}}`.
/// The snapshot is immutable for the duration of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FederationConfig {
    providers: BTreeMap<String, ProviderFederation>,
}

impl FederationConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a provider section.
    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: ProviderFederation,
    ) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyProviderName);
        }
        self.providers.insert(name, provider);
        Ok(self)
    }

    /// Returns the section for a provider, if present.
    pub fn provider(&self, name: &str) -> Option<&ProviderFederation> {
        self.providers.get(name)
    }

    /// Returns the configured provider names.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns true if the provider is present and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.provider(name).is_some_and(|p| p.enabled)
    }

    /// Returns the paths the store is expected to hold for a provider.
    ///
    /// Empty when the provider is disabled or absent.
    pub fn expected_paths(&self, name: &str) -> BTreeSet<ServerPath> {
        self.provider(name)
            .map(ProviderFederation::expected_paths)
            .unwrap_or_default()
    }

    /// Finds declared names of a provider that collapse onto the same path.
    ///
    /// Repeated declarations of the identical name are not collisions.
    pub fn path_collisions(&self, name: &str) -> Vec<PathCollision> {
        let Some(provider) = self.provider(name) else {
            return Vec::new();
        };

        let mut by_path: BTreeMap<ServerPath, Vec<String>> = BTreeMap::new();
        for server in &provider.servers {
            let names = by_path.entry(server.path()).or_default();
            if !names.contains(&server.name) {
                names.push(server.name.clone());
            }
        }

        by_path
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(path, names)| PathCollision { path, names })
            .collect()
    }
}
