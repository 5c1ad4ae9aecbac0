//! Error types for the reconciliation engine.

use fedreg_model::ServerPath;
use std::time::Duration;
use thiserror::Error;

/// Result type for reconciliation runs.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for server store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a [`crate::ServerStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The record does not exist.
    #[error("server not found: {0}")]
    NotFound(ServerPath),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Error returned by a [`crate::RoutingConfigPublisher`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("routing config publish failed: {0}")]
pub struct PublishError(pub String);

/// Error returned by a [`crate::MetricsSink`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("metrics error: {0}")]
pub struct MetricsError(pub String);

/// Errors raised by a reconciliation step.
///
/// Only a failure to read the provider's records aborts a run; the other
/// variants are logged by the orchestrator and never returned from
/// [`crate::Reconciler::reconcile`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Routing config regeneration failure.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// A collaborator call exceeded the configured timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The configured limit.
        timeout: Duration,
    },
}

impl ReconcileError {
    /// Returns true if a later run may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Store(e) => e.is_retryable(),
            ReconcileError::Publish(_) => true,
            ReconcileError::Timeout { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(StoreError::Unavailable("connection refused".into()).is_retryable());
        assert!(!StoreError::Backend("bad document".into()).is_retryable());
        assert!(!StoreError::NotFound(ServerPath::new("/x")).is_retryable());

        assert!(ReconcileError::from(StoreError::Unavailable("down".into())).is_retryable());
        assert!(ReconcileError::Timeout {
            operation: "list_by_source",
            timeout: Duration::from_secs(1),
        }
        .is_retryable());
    }

    #[test]
    fn error_display() {
        let err = ReconcileError::from(StoreError::NotFound(ServerPath::new("/org-gamma")));
        assert_eq!(err.to_string(), "server not found: /org-gamma");

        let err = ReconcileError::Timeout {
            operation: "list_by_source",
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "list_by_source timed out after 250ms");

        let err = ReconcileError::from(PublishError("nginx reload failed".into()));
        assert!(err.to_string().contains("nginx reload failed"));
    }
}
