//! OS file-backed sequential file.

use crate::error::{StorageError, StorageResult};
use crate::sequential::SequentialFile;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A sequential file stored on the local file system.
///
/// Data survives process restarts. Opening an existing file positions
/// it at its end, so new writes continue the stream.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Example
///
/// ```no_run
/// use seglog_storage::{FileSequentialFile, SequentialFile};
/// use std::path::Path;
///
/// let file = FileSequentialFile::open(Path::new("seglog-1.log")).unwrap();
/// file.write(b"persistent data").unwrap();
/// file.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileSequentialFile {
    path: PathBuf,
    state: RwLock<Option<OpenFile>>,
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    position: u64,
    size: u64,
}

impl FileSequentialFile {
    /// Opens or creates the file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let handle = Self {
            path: path.to_path_buf(),
            state: RwLock::new(None),
        };
        SequentialFile::open(&handle)?;
        Ok(handle)
    }

    /// Opens or creates the file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequentialFile for FileSequentialFile {
    fn file_name(&self) -> StorageResult<String> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                StorageError::NameUnavailable(format!(
                    "path {} has no UTF-8 file name",
                    self.path.display()
                ))
            })
    }

    fn open(&self) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        let size = file.metadata()?.len();

        *state = Some(OpenFile {
            file,
            position: size,
            size,
        });
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if let Some(mut open) = self.state.write().take() {
            open.file.flush()?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    fn position(&self) -> StorageResult<u64> {
        let state = self.state.read();
        let open = state.as_ref().ok_or(StorageError::Closed)?;
        Ok(open.position)
    }

    fn set_position(&self, position: u64) -> StorageResult<()> {
        let mut state = self.state.write();
        let open = state.as_mut().ok_or(StorageError::Closed)?;

        if position > open.size {
            return Err(StorageError::InvalidPosition {
                position,
                size: open.size,
            });
        }

        open.position = position;
        Ok(())
    }

    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut state = self.state.write();
        let open = state.as_mut().ok_or(StorageError::Closed)?;

        let size = open.size;
        let end = offset.saturating_add(len as u64);
        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        open.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        open.file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn write(&self, data: &[u8]) -> StorageResult<u64> {
        let mut state = self.state.write();
        let open = state.as_mut().ok_or(StorageError::Closed)?;

        let offset = open.position;
        if data.is_empty() {
            return Ok(offset);
        }

        open.file.seek(SeekFrom::Start(offset))?;
        open.file.write_all(data)?;
        open.position += data.len() as u64;
        open.size = open.size.max(open.position);

        Ok(offset)
    }

    fn size(&self) -> StorageResult<u64> {
        let state = self.state.read();
        let open = state.as_ref().ok_or(StorageError::Closed)?;
        Ok(open.size)
    }

    fn flush(&self) -> StorageResult<()> {
        let mut state = self.state.write();
        let open = state.as_mut().ok_or(StorageError::Closed)?;
        open.file.flush()?;
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        let state = self.state.read();
        let open = state.as_ref().ok_or(StorageError::Closed)?;
        open.file.sync_all()?;
        Ok(())
    }
}
