//! Reconciliation results and audit records.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Actor recorded for runs without an identity (startup, schedulers).
pub const SYSTEM_ACTOR: &str = "system";

/// Summary of one reconciliation run.
///
/// `removed_count` always equals `removed.len()`. In a dry run `removed`
/// lists what would be removed; nothing was touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Display names of removed servers, ordered by path.
    pub removed: Vec<String>,
    /// Number of removed servers.
    pub removed_count: usize,
    /// Number of servers the config declares for the provider.
    pub expected_count: usize,
    /// Number of provider records found in the store.
    pub actual_count: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Itemized removal failures. Empty on full success.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ReconciliationResult {
    /// A run that found nothing stale.
    pub(crate) fn converged(expected_count: usize, actual_count: usize, dry_run: bool) -> Self {
        Self::new(Vec::new(), expected_count, actual_count, dry_run, Vec::new())
    }

    pub(crate) fn new(
        removed: Vec<String>,
        expected_count: usize,
        actual_count: usize,
        dry_run: bool,
        errors: Vec<String>,
    ) -> Self {
        Self {
            removed_count: removed.len(),
            removed,
            expected_count,
            actual_count,
            dry_run,
            errors,
        }
    }

    /// Returns true if nothing was (or would be) removed and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.errors.is_empty()
    }

    /// Returns true if any removal failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Audit record of a run, emitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAudit {
    /// Unique record id.
    pub id: Uuid,
    /// Provider source that was reconciled.
    pub source: String,
    /// Actor identity, or [`SYSTEM_ACTOR`].
    pub triggered_by: String,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Removed (or would-be removed) server names.
    pub removed: Vec<String>,
    /// Number of removed servers.
    pub removed_count: usize,
    /// Declared server count.
    pub expected_count: usize,
    /// Stored record count before the run.
    pub actual_count: usize,
    /// Itemized failures.
    pub errors: Vec<String>,
    /// Milliseconds since the unix epoch.
    pub recorded_at_ms: u64,
}

impl ReconciliationAudit {
    /// Builds the audit record for `result`.
    pub fn from_result(result: &ReconciliationResult, source: &str, actor: Option<&str>) -> Self {
        let recorded_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            source: source.to_string(),
            triggered_by: actor.unwrap_or(SYSTEM_ACTOR).to_string(),
            dry_run: result.dry_run,
            removed: result.removed.clone(),
            removed_count: result.removed_count,
            expected_count: result.expected_count,
            actual_count: result.actual_count,
            errors: result.errors.clone(),
            recorded_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_count_tracks_removed() {
        let result = ReconciliationResult::new(
            vec!["org/gamma".into()],
            2,
            3,
            false,
            Vec::new(),
        );
        assert_eq!(result.removed_count, 1);
        assert!(!result.is_clean());
        assert!(!result.has_errors());
    }

    #[test]
    fn converged_result_is_clean() {
        let result = ReconciliationResult::converged(2, 2, false);
        assert!(result.is_clean());
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.expected_count, 2);
        assert_eq!(result.actual_count, 2);
    }

    #[test]
    fn serializes_field_names() {
        let result = ReconciliationResult::new(
            vec!["x".into()],
            0,
            1,
            false,
            vec!["Error removing /y: store unavailable: down".into()],
        );
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["removed"], serde_json::json!(["x"]));
        assert_eq!(value["removed_count"], 1);
        assert_eq!(value["expected_count"], 0);
        assert_eq!(value["actual_count"], 1);
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn audit_defaults_to_system_actor() {
        let result = ReconciliationResult::converged(1, 1, false);

        let audit = ReconciliationAudit::from_result(&result, "anthropic", None);
        assert_eq!(audit.triggered_by, SYSTEM_ACTOR);
        assert_eq!(audit.source, "anthropic");
        assert!(audit.recorded_at_ms > 0);

        let audit = ReconciliationAudit::from_result(&result, "anthropic", Some("admin"));
        assert_eq!(audit.triggered_by, "admin");
    }

    #[test]
    fn audit_ids_are_unique() {
        let result = ReconciliationResult::converged(0, 0, true);
        let a = ReconciliationAudit::from_result(&result, "anthropic", None);
        let b = ReconciliationAudit::from_result(&result, "anthropic", None);
        assert_ne!(a.id, b.id);
        assert!(a.dry_run);
    }
}
