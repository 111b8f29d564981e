//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the file.
    #[error("read beyond end of file: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current file size.
        size: u64,
    },

    /// Attempted to position the file beyond its end.
    #[error("invalid position {position}: file size is {size}")]
    InvalidPosition {
        /// The requested position.
        position: u64,
        /// The current file size.
        size: u64,
    },

    /// The file name could not be determined.
    #[error("file name unavailable: {0}")]
    NameUnavailable(String),

    /// The file is closed.
    #[error("file is closed")]
    Closed,
}
