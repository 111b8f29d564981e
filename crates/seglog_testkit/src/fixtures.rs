//! Test fixtures and journal helpers.
//!
//! Provides a registry pre-populated with journal files and a record
//! tracker, backed either by memory or by files in a temporary directory.

use seglog_core::{JournalConfig, JournalFileRegistry, RecordTracker};
use seglog_storage::{FileSequentialFile, InMemorySequentialFile};
use std::path::Path;
use tempfile::TempDir;

/// A test journal with automatic cleanup.
pub struct TestJournal {
    /// Registry holding the journal files.
    pub registry: JournalFileRegistry,
    /// Record tracker driving the file ledgers.
    pub tracker: RecordTracker,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestJournal {
    /// Creates a journal with `files` in-memory journal files.
    pub fn memory(files: usize) -> Self {
        let registry = JournalFileRegistry::new(JournalConfig::default());
        for _ in 0..files {
            let name = registry.file_name_for(registry.next_file_id());
            registry
                .create(Box::new(InMemorySequentialFile::new(name)))
                .expect("Failed to create in-memory journal file");
        }

        Self {
            registry,
            tracker: RecordTracker::new(),
            temp_dir: None,
        }
    }

    /// Creates a journal with `files` journal files in a temporary directory.
    pub fn file(files: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let registry = JournalFileRegistry::new(JournalConfig::default());
        for _ in 0..files {
            let path = temp_dir
                .path()
                .join(registry.file_name_for(registry.next_file_id()));
            let file = FileSequentialFile::open(&path).expect("Failed to open journal file");
            registry
                .create(Box::new(file))
                .expect("Failed to create journal file");
        }

        Self {
            registry,
            tracker: RecordTracker::new(),
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the journal directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }
}
