//! Per-file reference ledger.

use crate::types::FileId;
use parking_lot::RwLock;
use seglog_storage::SequentialFile;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mask applied to a file id to derive its 31-bit address tag.
///
/// Tags of ids above this value alias lower ids. The registry refuses
/// such ids; [`JournalFile::new`] does not.
pub const ADDRESS_TAG_MASK: u64 = 0x7FFF_FFFF;

/// Ids of the files a registry currently holds, shared with its ledgers.
pub(crate) type ActiveFiles = Arc<RwLock<HashSet<FileId>>>;

/// Reference-accounting ledger of one journal file.
///
/// A `JournalFile` is created once per physical file and shared (usually
/// through `Arc`) by the append path, replay and the compactor. All
/// counters are updated without a global lock.
///
/// # Counters
///
/// - `live_count`: records whose authoritative copy is in this file
/// - `live_bytes`: payload bytes of those records
/// - per-target invalidation counts: tombstones stored in this file,
///   keyed by the [`FileId`] of the file holding the invalidated record
/// - `invalidations_to_others`: sum of the per-target counts whose target
///   is not this file, maintained incrementally
///
/// Each counter is atomic on its own. A reader may see `live_count` and
/// `live_bytes` from different logical instants.
///
/// # Single-writer fields
///
/// `cursor` and the reclaim flag are stored in relaxed atomics and carry
/// no ordering. The owning controller serializes writes to them.
///
/// # Registered ledgers
///
/// A ledger created by a [`super::JournalFileRegistry`] only opens
/// counters for targets the registry still holds. Invalidations against
/// removed files are dropped, so per-target maps stay bounded by the
/// number of active files. Ledgers built with [`JournalFile::new`]
/// accept any target.
///
/// # Equality
///
/// Two ledgers are equal only if they are the same object. Ledgers built
/// with identical fields remain distinct.
pub struct JournalFile {
    file: Box<dyn SequentialFile>,
    file_id: FileId,
    address_tag: u32,
    format_version: u16,
    cursor: AtomicU64,
    live_count: AtomicI32,
    live_bytes: AtomicI64,
    reclaimable: AtomicBool,
    invalidations_to_others: AtomicU32,
    invalidations: RwLock<HashMap<FileId, AtomicU32>>,
    active_files: Option<ActiveFiles>,
}

impl JournalFile {
    /// Creates a ledger for `file` with zeroed counters.
    #[must_use]
    pub fn new(file: Box<dyn SequentialFile>, file_id: FileId, format_version: u16) -> Self {
        Self::build(file, file_id, format_version, None)
    }

    /// Creates a ledger that only counts invalidations against `active_files`.
    pub(crate) fn with_active_files(
        file: Box<dyn SequentialFile>,
        file_id: FileId,
        format_version: u16,
        active_files: ActiveFiles,
    ) -> Self {
        Self::build(file, file_id, format_version, Some(active_files))
    }

    fn build(
        file: Box<dyn SequentialFile>,
        file_id: FileId,
        format_version: u16,
        active_files: Option<ActiveFiles>,
    ) -> Self {
        Self {
            file,
            file_id,
            address_tag: (file_id.as_u64() & ADDRESS_TAG_MASK) as u32,
            format_version,
            cursor: AtomicU64::new(0),
            live_count: AtomicI32::new(0),
            live_bytes: AtomicI64::new(0),
            reclaimable: AtomicBool::new(false),
            invalidations_to_others: AtomicU32::new(0),
            invalidations: RwLock::new(HashMap::new()),
            active_files,
        }
    }

    // === Identity & placement ===

    /// Returns the file id.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Returns the low 31 bits of the file id, used where record
    /// addresses have a narrower file field.
    #[must_use]
    pub fn address_tag(&self) -> u32 {
        self.address_tag
    }

    /// Returns the record format version of this file.
    #[must_use]
    pub fn format_version(&self) -> u16 {
        self.format_version
    }

    /// Returns the underlying sequential file.
    #[must_use]
    pub fn file(&self) -> &dyn SequentialFile {
        self.file.as_ref()
    }

    /// Returns the placement cursor.
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Sets the placement cursor. Writers must be externally serialized.
    pub fn set_cursor(&self, cursor: u64) {
        self.cursor.store(cursor, Ordering::Relaxed);
    }

    // === Positive references ===

    /// Records one more live record reference into this file.
    pub fn increment_live(&self) {
        self.live_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops one live record reference from this file.
    pub fn decrement_live(&self) {
        let previous = self.live_count.fetch_sub(1, Ordering::AcqRel);
        if previous <= 0 {
            warn!(
                file_id = %self.file_id,
                live_count = previous - 1,
                "live count dropped below zero"
            );
        }
    }

    /// Returns the number of live record references.
    #[must_use]
    pub fn live_count(&self) -> i32 {
        self.live_count.load(Ordering::Acquire)
    }

    // === Negative references ===

    /// Records that this file now holds an invalidation of a record
    /// stored in `target`. `target` may be this file.
    ///
    /// The first invalidation against a target creates its counter under
    /// the map's write lock; later ones only take the shared lock and
    /// increment atomically. The aggregate is updated under the same
    /// guard, so pruning a target never races with its increments.
    ///
    /// A registered ledger ignores targets its registry no longer holds.
    pub fn record_invalidation(&self, target: FileId) {
        {
            let invalidations = self.invalidations.read();
            if let Some(count) = invalidations.get(&target) {
                count.fetch_add(1, Ordering::AcqRel);
                self.count_against_others(target);
                return;
            }
        }

        let mut invalidations = self.invalidations.write();
        if !invalidations.contains_key(&target) && !self.is_active(target) {
            debug!(
                file_id = %self.file_id,
                target = %target,
                "invalidation against inactive file ignored"
            );
            return;
        }

        invalidations
            .entry(target)
            .or_default()
            .fetch_add(1, Ordering::AcqRel);
        self.count_against_others(target);
    }

    fn count_against_others(&self, target: FileId) {
        if target != self.file_id {
            self.invalidations_to_others.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn is_active(&self, target: FileId) -> bool {
        self.active_files
            .as_ref()
            .map_or(true, |active| active.read().contains(&target))
    }

    /// Returns the number of invalidations this file holds against
    /// `target`, or 0 if there are none. Never creates an entry.
    #[must_use]
    pub fn invalidation_count(&self, target: FileId) -> u32 {
        self.invalidations
            .read()
            .get(&target)
            .map_or(0, |count| count.load(Ordering::Acquire))
    }

    /// Returns the number of invalidations this file holds against
    /// other files.
    #[must_use]
    pub fn invalidations_to_others(&self) -> u32 {
        self.invalidations_to_others.load(Ordering::Acquire)
    }

    /// Returns every `(target, count)` pair, ordered by target.
    #[must_use]
    pub fn invalidation_targets(&self) -> Vec<(FileId, u32)> {
        let mut targets: Vec<_> = self
            .invalidations
            .read()
            .iter()
            .map(|(target, count)| (*target, count.load(Ordering::Acquire)))
            .collect();
        targets.sort_unstable_by_key(|(target, _)| *target);
        targets
    }

    /// Drops the counter for a removed target. Returns the dropped count.
    pub(crate) fn forget_target(&self, target: FileId) -> u32 {
        let mut invalidations = self.invalidations.write();
        let Some(count) = invalidations.remove(&target) else {
            return 0;
        };

        let count = count.into_inner();
        if target != self.file_id {
            self.invalidations_to_others
                .fetch_sub(count, Ordering::AcqRel);
        }
        count
    }

    // === Live size ===

    /// Adds the size of a record that became live in this file.
    pub fn add_live_bytes(&self, bytes: u32) {
        self.live_bytes
            .fetch_add(i64::from(bytes), Ordering::AcqRel);
    }

    /// Removes the size of a record that died in this file.
    pub fn remove_live_bytes(&self, bytes: u32) {
        let previous = self
            .live_bytes
            .fetch_sub(i64::from(bytes), Ordering::AcqRel);
        if previous < i64::from(bytes) {
            warn!(
                file_id = %self.file_id,
                live_bytes = previous - i64::from(bytes),
                "live bytes dropped below zero"
            );
        }
    }

    /// Returns the live payload bytes.
    #[must_use]
    pub fn live_bytes(&self) -> i64 {
        self.live_bytes.load(Ordering::Acquire)
    }

    // === Reclaim flag ===

    /// Returns whether the compaction authority marked this file reclaimable.
    #[must_use]
    pub fn is_reclaimable(&self) -> bool {
        self.reclaimable.load(Ordering::Relaxed)
    }

    /// Sets the reclaim flag. Only the compaction authority calls this.
    pub fn set_reclaimable(&self, reclaimable: bool) {
        let previous = self.reclaimable.swap(reclaimable, Ordering::Relaxed);
        if previous != reclaimable {
            debug!(file_id = %self.file_id, reclaimable, "reclaim flag changed");
        }
    }

    // === Diagnostics ===

    /// Returns a point-in-time copy of every counter.
    ///
    /// Fields are read one at a time and are not mutually consistent
    /// while writers are active.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            file_id: self.file_id,
            address_tag: self.address_tag,
            format_version: self.format_version,
            cursor: self.cursor(),
            live_count: self.live_count(),
            live_bytes: self.live_bytes(),
            invalidations_to_others: self.invalidations_to_others(),
            reclaimable: self.is_reclaimable(),
        }
    }

    /// Lists every recorded invalidation target, one line per target,
    /// ordered by target id.
    #[must_use]
    pub fn describe_invalidations(&self) -> String {
        let mut out = String::new();
        for (target, count) in self.invalidation_targets() {
            // Writing to a String cannot fail
            let _ = writeln!(out, " target = {target} invalidations = {count}");
        }
        out
    }
}

impl fmt::Display for JournalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file.file_name() {
            Ok(name) => write!(
                f,
                "JournalFile({name}, id = {}, address_tag = {}, cursor = {})",
                self.file_id.as_u64(),
                self.address_tag,
                self.cursor()
            ),
            Err(err) => {
                debug!(file_id = %self.file_id, error = %err, "journal file name lookup failed");
                write!(f, "JournalFile(id = {}, error: {err})", self.file_id.as_u64())
            }
        }
    }
}

impl fmt::Debug for JournalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalFile")
            .field("file_id", &self.file_id)
            .field("address_tag", &self.address_tag)
            .field("format_version", &self.format_version)
            .field("live_count", &self.live_count())
            .field("live_bytes", &self.live_bytes())
            .field("reclaimable", &self.is_reclaimable())
            .finish_non_exhaustive()
    }
}

impl PartialEq for JournalFile {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for JournalFile {}

impl Hash for JournalFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_id.hash(state);
    }
}

/// A point-in-time copy of a [`JournalFile`]'s counters.
///
/// Unlike `JournalFile`, this is a plain value that can be compared,
/// logged, or passed across threads without atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// The file id.
    pub file_id: FileId,
    /// The 31-bit address tag.
    pub address_tag: u32,
    /// Record format version.
    pub format_version: u16,
    /// Placement cursor.
    pub cursor: u64,
    /// Live record references.
    pub live_count: i32,
    /// Live payload bytes.
    pub live_bytes: i64,
    /// Invalidations held against other files.
    pub invalidations_to_others: u32,
    /// Reclaim flag.
    pub reclaimable: bool,
}
