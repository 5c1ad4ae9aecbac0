//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A declared server name was empty.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// A provider name was empty.
    #[error("provider name must not be empty")]
    EmptyProviderName,
}
