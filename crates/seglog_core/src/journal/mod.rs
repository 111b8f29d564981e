//! Journal segment accounting.
//!
//! Every physical journal file has a [`JournalFile`] ledger that counts:
//!
//! - **live references**: records whose authoritative copy lives in the file
//! - **invalidations**: tombstones this file holds, per target file
//! - **live bytes**: payload bytes of the live records
//!
//! plus a reclaim flag set by the compaction authority.
//!
//! ## Invariants
//!
//! - Counters are independently atomic; there is no cross-field snapshot
//! - Invalidation entries only grow, until their target is removed from
//!   the [`JournalFileRegistry`]
//! - The reclaim flag is never derived from the counters
//! - Ledgers reference each other only by [`crate::FileId`], never by ownership

mod ledger;
mod registry;
mod tracker;

pub use ledger::{JournalFile, LedgerSnapshot, ADDRESS_TAG_MASK};
pub use registry::JournalFileRegistry;
pub use tracker::RecordTracker;
