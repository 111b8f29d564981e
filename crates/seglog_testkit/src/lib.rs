//! # seglog Testkit
//!
//! Test utilities for seglog.
//!
//! This crate provides:
//! - Journal fixtures backed by memory or temporary files
//! - Property-based generators of ledger operations using proptest,
//!   with a sequential reference model to check ledgers against
//! - Multi-threaded stress harnesses for the ledger and record tracker
//!
//! ## Usage
//!
//! ```rust
//! use seglog_testkit::prelude::*;
//!
//! let journal = TestJournal::memory(2);
//! let files = journal.registry.files();
//! let result = stress_concurrent_invalidations(
//!     &files[1],
//!     files[0].file_id(),
//!     &StressConfig::quick(),
//! );
//! assert_eq!(result.failed_ops, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
