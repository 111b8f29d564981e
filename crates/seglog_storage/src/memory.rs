//! In-memory sequential file for testing.

use crate::error::{StorageError, StorageResult};
use crate::sequential::SequentialFile;
use parking_lot::RwLock;

/// An in-memory sequential file.
///
/// This file keeps all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral journals that don't need persistence
///
/// A file created with [`InMemorySequentialFile::unnamed`] fails every
/// name lookup, which lets tests exercise callers that must tolerate it.
///
/// # Example
///
/// ```rust
/// use seglog_storage::{InMemorySequentialFile, SequentialFile};
///
/// let file = InMemorySequentialFile::new("seglog-1.log");
/// let offset = file.write(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(file.size().unwrap(), 9);
/// assert_eq!(file.position().unwrap(), 9);
/// ```
#[derive(Debug)]
pub struct InMemorySequentialFile {
    name: Option<String>,
    state: RwLock<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    data: Vec<u8>,
    position: u64,
    open: bool,
}

impl InMemorySequentialFile {
    /// Creates a new, empty and open file with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_data(name, Vec::new())
    }

    /// Creates an open file with pre-existing data, positioned at its end.
    ///
    /// Useful for testing replay scenarios.
    #[must_use]
    pub fn with_data(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::build(Some(name.into()), data)
    }

    /// Creates an open file whose name cannot be resolved.
    #[must_use]
    pub fn unnamed() -> Self {
        Self::build(None, Vec::new())
    }

    fn build(name: Option<String>, data: Vec<u8>) -> Self {
        let position = data.len() as u64;
        Self {
            name,
            state: RwLock::new(MemoryState {
                data,
                position,
                open: true,
            }),
        }
    }

    /// Returns a copy of all data in the file.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.state.read().data.clone()
    }
}

impl SequentialFile for InMemorySequentialFile {
    fn file_name(&self) -> StorageResult<String> {
        self.name
            .clone()
            .ok_or_else(|| StorageError::NameUnavailable("in-memory file has no name".into()))
    }

    fn open(&self) -> StorageResult<()> {
        self.state.write().open = true;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        self.state.write().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.read().open
    }

    fn position(&self) -> StorageResult<u64> {
        let state = self.state.read();
        if !state.open {
            return Err(StorageError::Closed);
        }
        Ok(state.position)
    }

    fn set_position(&self, position: u64) -> StorageResult<()> {
        let mut state = self.state.write();
        if !state.open {
            return Err(StorageError::Closed);
        }

        let size = state.data.len() as u64;
        if position > size {
            return Err(StorageError::InvalidPosition { position, size });
        }

        state.position = position;
        Ok(())
    }

    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let state = self.state.read();
        if !state.open {
            return Err(StorageError::Closed);
        }

        let size = state.data.len() as u64;
        let end = offset.saturating_add(len as u64);
        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        // Both bounds fit in usize once they are within the buffer
        let start = offset as usize;
        Ok(state.data[start..start + len].to_vec())
    }

    fn write(&self, data: &[u8]) -> StorageResult<u64> {
        let mut state = self.state.write();
        if !state.open {
            return Err(StorageError::Closed);
        }

        let start = state.position as usize;
        let end = start + data.len();
        if end > state.data.len() {
            state.data.resize(end, 0);
        }
        state.data[start..end].copy_from_slice(data);
        state.position = end as u64;

        Ok(start as u64)
    }

    fn size(&self) -> StorageResult<u64> {
        let state = self.state.read();
        if !state.open {
            return Err(StorageError::Closed);
        }
        Ok(state.data.len() as u64)
    }

    fn flush(&self) -> StorageResult<()> {
        // Nothing is buffered
        if !self.is_open() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        self.flush()
    }
}
