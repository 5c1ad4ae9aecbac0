//! Declared-versus-actual state diff.
//!
//! Pure functions only. The orchestrator feeds them a config snapshot and the
//! record snapshot it fetched once at the start of a run.

use fedreg_model::{FederationConfig, ProviderFederation, RecordMap, ServerPath};
use std::collections::BTreeSet;

/// Returns the paths present in `actual` that `provider` does not declare.
///
/// An absent or disabled provider declares nothing, so every actual path is
/// stale. An empty `actual` always yields an empty set.
pub fn compute_stale_set(
    provider: Option<&ProviderFederation>,
    actual: &RecordMap,
) -> BTreeSet<ServerPath> {
    let expected = provider
        .map(ProviderFederation::expected_paths)
        .unwrap_or_default();
    stale_paths(&expected, actual)
}

fn stale_paths(expected: &BTreeSet<ServerPath>, actual: &RecordMap) -> BTreeSet<ServerPath> {
    actual
        .keys()
        .filter(|path| !expected.contains(*path))
        .cloned()
        .collect()
}

/// The diff for one provider, with the counts reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDiff {
    /// Paths the config expects in the store.
    pub expected: BTreeSet<ServerPath>,
    /// Number of records found in the store for the provider.
    pub actual_count: usize,
    /// Stale paths, in ascending order.
    pub stale: BTreeSet<ServerPath>,
}

impl StateDiff {
    /// Computes the diff of `source` between `config` and `actual`.
    pub fn compute(config: &FederationConfig, source: &str, actual: &RecordMap) -> Self {
        let expected = config.expected_paths(source);
        let stale = stale_paths(&expected, actual);
        Self {
            expected,
            actual_count: actual.len(),
            stale,
        }
    }

    /// Returns true when nothing needs removing.
    pub fn is_converged(&self) -> bool {
        self.stale.is_empty()
    }

    /// Returns the display names of the stale records, ordered by path.
    pub fn stale_names(&self, actual: &RecordMap) -> Vec<String> {
        self.stale
            .iter()
            .map(|path| display_name(actual, path))
            .collect()
    }
}

/// Display name of `path` in `actual`, falling back to the path itself.
pub(crate) fn display_name(actual: &RecordMap, path: &ServerPath) -> String {
    actual
        .get(path)
        .map(|record| record.display_name())
        .unwrap_or(path.as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedreg_model::ServerRecord;
    use proptest::prelude::*;

    fn records(names: &[&str]) -> RecordMap {
        names
            .iter()
            .map(|name| {
                let record = ServerRecord::federated(name, "anthropic");
                (record.path.clone(), record)
            })
            .collect()
    }

    fn provider(enabled: bool, names: &[&str]) -> ProviderFederation {
        let mut provider = ProviderFederation::enabled(names.iter().copied()).unwrap();
        provider.enabled = enabled;
        provider
    }

    fn paths(set: &BTreeSet<ServerPath>) -> Vec<&str> {
        set.iter().map(ServerPath::as_str).collect()
    }

    #[test]
    fn undeclared_record_is_stale() {
        let provider = provider(true, &["org/alpha", "org/beta"]);
        let actual = records(&["org/alpha", "org/beta", "org/gamma"]);

        let stale = compute_stale_set(Some(&provider), &actual);
        assert_eq!(paths(&stale), vec!["/org-gamma"]);
    }

    #[test]
    fn disabled_provider_makes_everything_stale() {
        let provider = provider(false, &["org/alpha"]);
        let actual = records(&["org/alpha", "x"]);

        let stale = compute_stale_set(Some(&provider), &actual);
        assert_eq!(paths(&stale), vec!["/org-alpha", "/x"]);
    }

    #[test]
    fn absent_provider_makes_everything_stale() {
        let actual = records(&["x"]);
        assert_eq!(paths(&compute_stale_set(None, &actual)), vec!["/x"]);
    }

    #[test]
    fn empty_actual_is_never_stale() {
        let actual = RecordMap::new();
        assert!(compute_stale_set(Some(&provider(true, &["a"])), &actual).is_empty());
        assert!(compute_stale_set(Some(&provider(false, &[])), &actual).is_empty());
        assert!(compute_stale_set(None, &actual).is_empty());
    }

    #[test]
    fn enabled_provider_with_no_servers_makes_everything_stale() {
        let actual = records(&["a", "b"]);
        let stale = compute_stale_set(Some(&provider(true, &[])), &actual);
        assert_eq!(stale.len(), 2);
    }

    #[test]
    fn declared_but_missing_servers_are_ignored() {
        let provider = provider(true, &["org/alpha", "org/delta"]);
        let actual = records(&["org/alpha"]);
        assert!(compute_stale_set(Some(&provider), &actual).is_empty());
    }

    #[test]
    fn state_diff_counts() {
        let config = FederationConfig::new()
            .with_provider("anthropic", provider(true, &["org/alpha", "org/beta"]))
            .unwrap();
        let actual = records(&["org/alpha", "org/beta", "org/gamma"]);

        let diff = StateDiff::compute(&config, "anthropic", &actual);
        assert_eq!(diff.expected.len(), 2);
        assert_eq!(diff.actual_count, 3);
        assert!(!diff.is_converged());
        assert_eq!(diff.stale_names(&actual), vec!["org/gamma".to_string()]);
    }

    #[test]
    fn stale_names_fall_back_to_path() {
        let mut actual = RecordMap::new();
        actual.insert(ServerPath::new("/x"), ServerRecord::new("/x", "", "anthropic"));

        let diff = StateDiff::compute(&FederationConfig::new(), "anthropic", &actual);
        assert_eq!(diff.stale_names(&actual), vec!["/x".to_string()]);
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z]{1,6}(/[a-z]{1,6})?").expect("Invalid regex")
    }

    proptest! {
        #[test]
        fn disabled_totality(
            declared in prop::collection::vec(name_strategy(), 0..8),
            present in prop::collection::vec(name_strategy(), 0..8),
        ) {
            let present: Vec<&str> = present.iter().map(String::as_str).collect();
            let declared: Vec<&str> = declared.iter().map(String::as_str).collect();
            let actual = records(&present);

            let stale = compute_stale_set(Some(&provider(false, &declared)), &actual);
            prop_assert_eq!(stale, actual.keys().cloned().collect::<BTreeSet<_>>());
        }

        #[test]
        fn stale_is_subset_of_actual_and_disjoint_from_expected(
            declared in prop::collection::vec(name_strategy(), 0..8),
            present in prop::collection::vec(name_strategy(), 0..8),
        ) {
            let present: Vec<&str> = present.iter().map(String::as_str).collect();
            let declared: Vec<&str> = declared.iter().map(String::as_str).collect();
            let provider = provider(true, &declared);
            let actual = records(&present);

            let stale = compute_stale_set(Some(&provider), &actual);
            let expected = provider.expected_paths();
            for path in &stale {
                prop_assert!(actual.contains_key(path));
                prop_assert!(!expected.contains(path));
            }
        }

        #[test]
        fn removing_stale_converges(
            declared in prop::collection::vec(name_strategy(), 0..8),
            present in prop::collection::vec(name_strategy(), 0..8),
        ) {
            let present: Vec<&str> = present.iter().map(String::as_str).collect();
            let declared: Vec<&str> = declared.iter().map(String::as_str).collect();
            let provider = provider(true, &declared);
            let mut actual = records(&present);

            for path in compute_stale_set(Some(&provider), &actual) {
                actual.remove(&path);
            }
            prop_assert!(compute_stale_set(Some(&provider), &actual).is_empty());
        }
    }
}
