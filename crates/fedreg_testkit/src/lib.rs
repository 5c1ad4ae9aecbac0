//! # fedreg Testkit
//!
//! Test utilities for fedreg.
//!
//! This crate provides:
//! - Store, publisher and metrics doubles with call counting and fault injection
//! - Fixtures for federation configs, seeded stores and a wired reconciler
//! - Property-based test generators using proptest
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fedreg_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn removes_stale() {
//!     let harness = Harness::seeded(&["org/alpha", "org/gamma"]);
//!     let result = harness
//!         .reconciler
//!         .reconcile(&federation(&["org/alpha"]), ReconcileOptions::default())
//!         .await
//!         .unwrap();
//!     assert_eq!(result.removed_count, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use fedreg_reconcile::ReconcileOptions;
}

pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
