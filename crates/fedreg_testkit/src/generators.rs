//! Property-based test generators using proptest.
//!
//! Names are drawn from a small alphabet so declared and stored sets overlap
//! often enough to exercise both the keep and the remove paths.

use fedreg_model::ServerRecord;
use proptest::prelude::*;

/// Strategy for declared server names such as `"ab/cd"` or `"x"`.
pub fn server_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-d]{1,2}(/[a-d]{1,2})?").expect("Invalid regex")
}

/// Strategy for a list of declared names, possibly with repeats.
pub fn declared_names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(server_name_strategy(), 0..10)
}

/// A generated reconciliation scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Whether the provider is enabled.
    pub enabled: bool,
    /// Names the config declares.
    pub declared: Vec<String>,
    /// Names present in the store for the provider.
    pub stored: Vec<String>,
    /// Names stored under a different source.
    pub foreign: Vec<String>,
}

impl Scenario {
    /// Declared names as string slices.
    pub fn declared_refs(&self) -> Vec<&str> {
        self.declared.iter().map(String::as_str).collect()
    }

    /// Records for the store: provider records plus foreign ones.
    pub fn records(&self, source: &str) -> Vec<ServerRecord> {
        let own = self
            .stored
            .iter()
            .map(|name| ServerRecord::federated(name, source));
        // Foreign records live under a distinct prefix so they never share a
        // path with the provider's records.
        let foreign = self.foreign.iter().map(|name| {
            ServerRecord::new(format!("/local-{name}"), name.as_str(), "local")
        });
        own.chain(foreign).collect()
    }
}

/// Strategy for reconciliation scenarios.
pub fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (
        any::<bool>(),
        declared_names_strategy(),
        declared_names_strategy(),
        prop::collection::vec(server_name_strategy(), 0..4),
    )
        .prop_map(|(enabled, declared, stored, foreign)| Scenario {
            enabled,
            declared,
            stored,
            foreign,
        })
}
