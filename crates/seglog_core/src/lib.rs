//! # seglog Core
//!
//! Per-segment reference accounting for the seglog journal.
//!
//! This crate provides:
//! - [`JournalFile`], the ledger kept for every physical journal segment
//! - [`JournalFileRegistry`], the arena that owns ledgers by [`FileId`]
//! - [`RecordTracker`], the append/replay path that drives the ledgers
//!
//! Counters are derived, in-memory state. They are rebuilt on replay and
//! never persisted. Deciding which segments to reclaim belongs to the
//! compaction authority; this crate only records its verdict.
//!
//! ## Example
//!
//! ```rust
//! use seglog_core::{JournalConfig, JournalFileRegistry, RecordId, RecordTracker};
//! use seglog_storage::InMemorySequentialFile;
//!
//! let registry = JournalFileRegistry::new(JournalConfig::default());
//! let first = registry
//!     .create(Box::new(InMemorySequentialFile::new("seglog-1.log")))
//!     .unwrap();
//! let second = registry
//!     .create(Box::new(InMemorySequentialFile::new("seglog-2.log")))
//!     .unwrap();
//!
//! let tracker = RecordTracker::new();
//! tracker.append_add(RecordId::new(7), &first, 50).unwrap();
//! tracker.append_delete(RecordId::new(7), &second).unwrap();
//!
//! assert_eq!(first.live_count(), 0);
//! assert_eq!(first.live_bytes(), 0);
//! assert_eq!(second.invalidation_count(first.file_id()), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod journal;
mod types;

pub use config::{JournalConfig, FORMAT_VERSION};
pub use error::{CoreError, CoreResult};
pub use journal::{
    JournalFile, JournalFileRegistry, LedgerSnapshot, RecordTracker, ADDRESS_TAG_MASK,
};
pub use types::{FileId, RecordId};
