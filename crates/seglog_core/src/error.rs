//! Error types for seglog core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in seglog core operations.
///
/// Counter mutation never fails; these errors come from the registry and
/// the record tracker.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A file id does not fit the 31-bit address tag.
    #[error("file id {file_id} exceeds the address tag range")]
    AddressTagExhausted {
        /// The offending file id.
        file_id: u64,
    },

    /// A file with this id is already registered.
    #[error("journal file {file_id} is already registered")]
    DuplicateFile {
        /// The duplicated file id.
        file_id: u64,
    },

    /// A record with this id is already live.
    #[error("record {record_id} is already live")]
    DuplicateRecord {
        /// The duplicated record id.
        record_id: u64,
    },

    /// No live record with this id is known.
    #[error("record {record_id} is not live")]
    UnknownRecord {
        /// The unknown record id.
        record_id: u64,
    },
}

impl CoreError {
    /// Creates an address tag exhausted error.
    pub fn address_tag_exhausted(file_id: u64) -> Self {
        Self::AddressTagExhausted { file_id }
    }

    /// Creates a duplicate file error.
    pub fn duplicate_file(file_id: u64) -> Self {
        Self::DuplicateFile { file_id }
    }

    /// Creates a duplicate record error.
    pub fn duplicate_record(record_id: u64) -> Self {
        Self::DuplicateRecord { record_id }
    }

    /// Creates an unknown record error.
    pub fn unknown_record(record_id: u64) -> Self {
        Self::UnknownRecord { record_id }
    }
}
