//! Registry of active journal files.

use crate::config::JournalConfig;
use crate::error::{CoreError, CoreResult};
use crate::journal::ledger::{ActiveFiles, JournalFile, LedgerSnapshot, ADDRESS_TAG_MASK};
use crate::types::FileId;
use parking_lot::RwLock;
use seglog_storage::SequentialFile;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the ledger of every active journal file, addressed by [`FileId`].
///
/// Ledgers refer to each other only by id; the registry is the single
/// owner. Removing a file prunes the invalidation counters other files
/// hold against it, and registered ledgers refuse to open new counters
/// for ids the registry no longer holds, so the per-file maps stay
/// bounded by the number of active files even if a writer still holds
/// the removed ledger.
///
/// File ids are allocated monotonically and kept within
/// [`ADDRESS_TAG_MASK`], so address tags never alias inside a registry.
pub struct JournalFileRegistry {
    config: JournalConfig,
    state: RwLock<RegistryState>,
    active: ActiveFiles,
}

struct RegistryState {
    next_id: u64,
    files: BTreeMap<FileId, Arc<JournalFile>>,
}

impl JournalFileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: JournalConfig) -> Self {
        let next_id = config.first_file_id;
        Self {
            config,
            state: RwLock::new(RegistryState {
                next_id,
                files: BTreeMap::new(),
            }),
            active: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Registers a new file under the next id, using the configured
    /// format version.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AddressTagExhausted`] once ids would exceed
    /// the address tag range.
    pub fn create(&self, file: Box<dyn SequentialFile>) -> CoreResult<Arc<JournalFile>> {
        let mut state = self.state.write();

        let id = state.next_id;
        if id > ADDRESS_TAG_MASK {
            return Err(CoreError::address_tag_exhausted(id));
        }
        state.next_id = id + 1;

        let journal_file = Arc::new(JournalFile::with_active_files(
            file,
            FileId::new(id),
            self.config.format_version,
            Arc::clone(&self.active),
        ));
        self.active.write().insert(FileId::new(id));
        state.files.insert(FileId::new(id), Arc::clone(&journal_file));

        debug!(file_id = id, "journal file created");
        Ok(journal_file)
    }

    /// Registers a file found during replay under its persisted id.
    ///
    /// Later calls to [`Self::create`] allocate ids above `file_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `file_id` is already registered or exceeds the
    /// address tag range.
    pub fn adopt(
        &self,
        file: Box<dyn SequentialFile>,
        file_id: FileId,
        format_version: u16,
    ) -> CoreResult<Arc<JournalFile>> {
        let mut state = self.state.write();

        if file_id.as_u64() > ADDRESS_TAG_MASK {
            return Err(CoreError::address_tag_exhausted(file_id.as_u64()));
        }
        if state.files.contains_key(&file_id) {
            return Err(CoreError::duplicate_file(file_id.as_u64()));
        }

        let journal_file = Arc::new(JournalFile::with_active_files(
            file,
            file_id,
            format_version,
            Arc::clone(&self.active),
        ));
        self.active.write().insert(file_id);
        state.files.insert(file_id, Arc::clone(&journal_file));
        state.next_id = state.next_id.max(file_id.as_u64() + 1);

        debug!(file_id = %file_id, format_version, "journal file adopted");
        Ok(journal_file)
    }

    /// Removes a file and prunes the invalidation counters other files
    /// hold against it. Later invalidations against it are ignored.
    ///
    /// Returns the removed ledger, or `None` if the id is unknown.
    pub fn remove(&self, file_id: FileId) -> Option<Arc<JournalFile>> {
        let mut state = self.state.write();
        let removed = state.files.remove(&file_id)?;

        // Retire the id before pruning so no counter is recreated in between
        self.active.write().remove(&file_id);

        if removed.live_count() > 0 {
            warn!(
                file_id = %file_id,
                live_count = removed.live_count(),
                "removed journal file still has live references"
            );
        }

        let pruned: u64 = state
            .files
            .values()
            .map(|file| u64::from(file.forget_target(file_id)))
            .sum();

        debug!(file_id = %file_id, pruned, "journal file removed");
        Some(removed)
    }

    /// Returns the ledger for `file_id`.
    #[must_use]
    pub fn get(&self, file_id: FileId) -> Option<Arc<JournalFile>> {
        self.state.read().files.get(&file_id).cloned()
    }

    /// Returns whether `file_id` is registered.
    #[must_use]
    pub fn contains(&self, file_id: FileId) -> bool {
        self.state.read().files.contains_key(&file_id)
    }

    /// Returns the number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().files.len()
    }

    /// Returns whether no files are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().files.is_empty()
    }

    /// Returns the id the next [`Self::create`] call will use.
    #[must_use]
    pub fn next_file_id(&self) -> FileId {
        FileId::new(self.state.read().next_id)
    }

    /// Returns all ledgers in ascending id (replay) order.
    #[must_use]
    pub fn files(&self) -> Vec<Arc<JournalFile>> {
        self.state.read().files.values().cloned().collect()
    }

    /// Returns a snapshot of every ledger in ascending id order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<LedgerSnapshot> {
        self.state
            .read()
            .files
            .values()
            .map(|file| file.snapshot())
            .collect()
    }

    /// Returns the configured file name for `file_id`.
    #[must_use]
    pub fn file_name_for(&self, file_id: FileId) -> String {
        format!(
            "{}-{}.{}",
            self.config.file_prefix,
            file_id.as_u64(),
            self.config.file_extension
        )
    }
}

impl std::fmt::Debug for JournalFileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("JournalFileRegistry")
            .field("next_id", &state.next_id)
            .field("file_count", &state.files.len())
            .finish_non_exhaustive()
    }
}
