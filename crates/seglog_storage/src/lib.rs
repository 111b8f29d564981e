//! # seglog Storage
//!
//! Sequential file abstraction for seglog journal segments.
//!
//! This crate provides the lowest-level storage abstraction for seglog.
//! A sequential file is an **opaque byte stream** with a write position;
//! it does not interpret the records written into it.
//!
//! ## Design Principles
//!
//! - Files are simple byte streams (open, close, position, read, write)
//! - No knowledge of journal record formats or reference accounting
//! - Must be `Send + Sync` so a segment ledger can be shared across threads
//! - Callers serialize writes and positioning; reads may run concurrently
//!
//! ## Available Implementations
//!
//! - [`InMemorySequentialFile`] - For testing and ephemeral journals
//! - [`FileSequentialFile`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use seglog_storage::{InMemorySequentialFile, SequentialFile};
//!
//! let file = InMemorySequentialFile::new("seglog-1.log");
//! let offset = file.write(b"hello world").unwrap();
//! let data = file.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod sequential;

pub use error::{StorageError, StorageResult};
pub use file::FileSequentialFile;
pub use memory::InMemorySequentialFile;
pub use sequential::SequentialFile;
