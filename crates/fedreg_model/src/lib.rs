//! # fedreg Model
//!
//! Data model shared by the fedreg crates.
//!
//! This crate provides:
//! - [`FederationConfig`]: the declared, per-provider federation state
//! - [`ServerPath`]: the storage identifier and the name-to-path mapping rule
//! - [`ServerRecord`]: a locally stored server entry with its provenance tag
//!
//! ## Key Invariants
//!
//! - A declared name maps to exactly one path (`/` becomes `-`, plus a leading `/`)
//! - The same mapping is used for expected and actual paths
//! - A provider that is absent or disabled declares nothing
//!
//! ## Example
//!
//! ```rust
//! use fedreg_model::{FederationConfig, ServerPath};
//!
//! let config: FederationConfig = serde_json::from_str(
//!     r#"{"anthropic": {"enabled": true, "servers": [{"name": "org/alpha"}]}}"#,
//! ).unwrap();
//!
//! let expected = config.expected_paths("anthropic");
//! assert!(expected.contains(&ServerPath::from_server_name("org/alpha")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod path;
mod record;

pub use config::{DeclaredServer, FederationConfig, PathCollision, ProviderFederation};
pub use error::{ModelError, ModelResult};
pub use path::ServerPath;
pub use record::{RecordMap, ServerRecord};
