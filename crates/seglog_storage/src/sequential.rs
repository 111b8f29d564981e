//! Sequential file trait definition.

use crate::error::StorageResult;

/// A physical journal segment file.
///
/// Sequential files are **opaque byte streams** with a write position.
/// The journal owns all record format interpretation.
///
/// # Invariants
///
/// - `write` stores data at the current position and advances it
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `sync` ensures all written data is durable
/// - Operations other than `open`, `is_open` and `file_name` fail with
///   [`crate::StorageError::Closed`] on a closed file
///
/// # Thread Safety
///
/// Implementations are `Send + Sync`. Writes and positioning must be
/// serialized by the caller (the journal controller owns the write path);
/// reads may be issued concurrently.
pub trait SequentialFile: Send + Sync {
    /// Returns the name of the file, without directory components.
    ///
    /// # Errors
    ///
    /// Returns an error if the name cannot be determined.
    fn file_name(&self) -> StorageResult<String>;

    /// Opens the file, or does nothing if it is already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying file cannot be opened.
    fn open(&self) -> StorageResult<()>;

    /// Closes the file. Closing a closed file is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    fn close(&self) -> StorageResult<()>;

    /// Returns whether the file is open.
    fn is_open(&self) -> bool;

    /// Returns the current write position.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is closed.
    fn position(&self) -> StorageResult<u64>;

    /// Moves the write position.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is closed or `position` is past the end.
    fn set_position(&self, position: u64) -> StorageResult<()>;

    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is closed
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes data at the current position and advances it.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is closed or an I/O error occurs.
    fn write(&self, data: &[u8]) -> StorageResult<u64>;

    /// Returns the current size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is closed or the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Flushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&self) -> StorageResult<()>;
}
