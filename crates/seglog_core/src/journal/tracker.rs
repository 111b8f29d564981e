//! Live record tracking for the append and replay paths.

use crate::error::{CoreError, CoreResult};
use crate::journal::ledger::JournalFile;
use crate::types::RecordId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks where the current copy of every live record is stored and
/// keeps the file ledgers in step with appends.
///
/// An update supersedes the previous copy, so each record has exactly
/// one live location.
///
/// | Call | Effect on ledgers |
/// |------|-------------------|
/// | `append_add` in F | F: live +1, bytes +size |
/// | `append_update` in G, current copy in F | F: live -1, bytes -old size; G: invalidation of F +1, live +1, bytes +size |
/// | `append_delete` in G, current copy in F | F: live -1, bytes -size; G: invalidation of F +1 |
///
/// Replay issues the same calls in log order to rebuild the counters.
#[derive(Debug, Default)]
pub struct RecordTracker {
    records: Mutex<HashMap<RecordId, RecordLocation>>,
}

#[derive(Debug)]
struct RecordLocation {
    file: Arc<JournalFile>,
    size: u32,
}

impl RecordLocation {
    fn new(file: &Arc<JournalFile>, size: u32) -> Self {
        file.increment_live();
        file.add_live_bytes(size);
        Self {
            file: Arc::clone(file),
            size,
        }
    }

    /// Releases this copy, charging the invalidation to `invalidating_file`.
    fn release(self, invalidating_file: &JournalFile) {
        invalidating_file.record_invalidation(self.file.file_id());
        self.file.decrement_live();
        self.file.remove_live_bytes(self.size);
    }
}

impl RecordTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new record of `size` bytes appended to `file`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateRecord`] if the record is already live.
    pub fn append_add(
        &self,
        record_id: RecordId,
        file: &Arc<JournalFile>,
        size: u32,
    ) -> CoreResult<()> {
        let mut records = self.records.lock();
        if records.contains_key(&record_id) {
            return Err(CoreError::duplicate_record(record_id.as_u64()));
        }

        records.insert(record_id, RecordLocation::new(file, size));
        Ok(())
    }

    /// Records an update of a live record appended to `file`.
    ///
    /// The previous copy is superseded: its file loses a live reference
    /// and its bytes, and `file` gains an invalidation against it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownRecord`] if the record is not live.
    pub fn append_update(
        &self,
        record_id: RecordId,
        file: &Arc<JournalFile>,
        size: u32,
    ) -> CoreResult<()> {
        let mut records = self.records.lock();
        let current = records
            .get_mut(&record_id)
            .ok_or_else(|| CoreError::unknown_record(record_id.as_u64()))?;

        let previous = std::mem::replace(current, RecordLocation::new(file, size));
        previous.release(file);
        Ok(())
    }

    /// Records a tombstone for a live record appended to `tombstone_file`.
    ///
    /// The file holding the current copy loses a live reference and its
    /// bytes, and `tombstone_file` gains an invalidation against it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownRecord`] if the record is not live.
    pub fn append_delete(&self, record_id: RecordId, tombstone_file: &JournalFile) -> CoreResult<()> {
        let current = self
            .records
            .lock()
            .remove(&record_id)
            .ok_or_else(|| CoreError::unknown_record(record_id.as_u64()))?;

        current.release(tombstone_file);
        Ok(())
    }

    /// Returns whether the record is live.
    #[must_use]
    pub fn contains(&self, record_id: RecordId) -> bool {
        self.records.lock().contains_key(&record_id)
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn live_records(&self) -> usize {
        self.records.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileId;
    use seglog_storage::InMemorySequentialFile;
    use std::thread;

    fn ledger(id: u64) -> Arc<JournalFile> {
        Arc::new(JournalFile::new(
            Box::new(InMemorySequentialFile::new(format!("seglog-{id}.log"))),
            FileId::new(id),
            1,
        ))
    }

    #[test]
    fn add_takes_live_reference() {
        let tracker = RecordTracker::new();
        let f = ledger(1);

        tracker.append_add(RecordId::new(1), &f, 50).unwrap();

        assert!(tracker.contains(RecordId::new(1)));
        assert_eq!(f.live_count(), 1);
        assert_eq!(f.live_bytes(), 50);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let tracker = RecordTracker::new();
        let f = ledger(1);
        tracker.append_add(RecordId::new(1), &f, 10).unwrap();

        let result = tracker.append_add(RecordId::new(1), &f, 10);
        assert!(matches!(
            result,
            Err(CoreError::DuplicateRecord { record_id: 1 })
        ));
        assert_eq!(f.live_count(), 1);
    }

    #[test]
    fn delete_in_other_file_releases_and_invalidates() {
        let tracker = RecordTracker::new();
        let f = ledger(1);
        let g = ledger(2);

        tracker.append_add(RecordId::new(1), &f, 50).unwrap();
        tracker.append_delete(RecordId::new(1), &g).unwrap();

        assert_eq!(f.live_count(), 0);
        assert_eq!(f.live_bytes(), 0);
        assert_eq!(g.invalidation_count(f.file_id()), 1);
        assert_eq!(g.invalidations_to_others(), 1);
        assert_eq!(tracker.live_records(), 0);
    }

    #[test]
    fn delete_in_same_file_is_self_invalidation() {
        let tracker = RecordTracker::new();
        let f = ledger(1);

        tracker.append_add(RecordId::new(1), &f, 20).unwrap();
        tracker.append_delete(RecordId::new(1), &f).unwrap();

        assert_eq!(f.live_count(), 0);
        assert_eq!(f.invalidation_count(f.file_id()), 1);
        assert_eq!(f.invalidations_to_others(), 0);
    }

    #[test]
    fn update_in_other_file_supersedes_previous_copy() {
        let tracker = RecordTracker::new();
        let f = ledger(1);
        let g = ledger(2);

        tracker.append_add(RecordId::new(1), &f, 50).unwrap();
        tracker.append_update(RecordId::new(1), &g, 30).unwrap();

        assert_eq!(f.live_count(), 0);
        assert_eq!(f.live_bytes(), 0);
        assert_eq!(g.live_count(), 1);
        assert_eq!(g.live_bytes(), 30);
        assert_eq!(g.invalidation_count(f.file_id()), 1);
        assert_eq!(g.invalidations_to_others(), 1);
        assert_eq!(tracker.live_records(), 1);
    }

    #[test]
    fn update_in_same_file_swaps_size() {
        let tracker = RecordTracker::new();
        let f = ledger(1);

        tracker.append_add(RecordId::new(1), &f, 10).unwrap();
        tracker.append_update(RecordId::new(1), &f, 25).unwrap();

        assert_eq!(f.live_count(), 1);
        assert_eq!(f.live_bytes(), 25);
        assert_eq!(f.invalidation_count(f.file_id()), 1);
        assert_eq!(f.invalidations_to_others(), 0);
    }

    #[test]
    fn delete_releases_only_current_copy() {
        let tracker = RecordTracker::new();
        let f = ledger(1);
        let g = ledger(2);
        let h = ledger(3);

        tracker.append_add(RecordId::new(1), &f, 10).unwrap();
        tracker.append_update(RecordId::new(1), &f, 5).unwrap();
        tracker.append_update(RecordId::new(1), &g, 7).unwrap();
        assert_eq!(f.live_count(), 0);
        assert_eq!(g.live_bytes(), 7);

        tracker.append_delete(RecordId::new(1), &h).unwrap();

        assert_eq!(f.live_count(), 0);
        assert_eq!(f.live_bytes(), 0);
        assert_eq!(g.live_count(), 0);
        assert_eq!(g.live_bytes(), 0);
        assert_eq!(f.invalidation_count(f.file_id()), 1);
        assert_eq!(g.invalidation_count(f.file_id()), 1);
        assert_eq!(h.invalidation_count(f.file_id()), 0);
        assert_eq!(h.invalidation_count(g.file_id()), 1);
        assert_eq!(h.invalidations_to_others(), 1);
    }

    #[test]
    fn unknown_records_are_rejected() {
        let tracker = RecordTracker::new();
        let f = ledger(1);

        assert!(matches!(
            tracker.append_update(RecordId::new(9), &f, 1),
            Err(CoreError::UnknownRecord { record_id: 9 })
        ));
        assert!(matches!(
            tracker.append_delete(RecordId::new(9), &f),
            Err(CoreError::UnknownRecord { record_id: 9 })
        ));
        assert_eq!(f.live_count(), 0);
        assert!(f.invalidation_targets().is_empty());
    }

    #[test]
    fn concurrent_appends_and_deletes() {
        let tracker = Arc::new(RecordTracker::new());
        let f = ledger(1);
        let g = ledger(2);
        let mut handles = vec![];

        for t in 0..4u64 {
            let tracker = Arc::clone(&tracker);
            let f = Arc::clone(&f);
            let g = Arc::clone(&g);
            handles.push(thread::spawn(move || {
                for i in 0..250u64 {
                    let id = RecordId::new(t * 1000 + i);
                    tracker.append_add(id, &f, 4).unwrap();
                    if i % 2 == 0 {
                        tracker.append_delete(id, &g).unwrap();
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(tracker.live_records(), 500);
        assert_eq!(f.live_count(), 500);
        assert_eq!(f.live_bytes(), 2000);
        assert_eq!(g.invalidation_count(f.file_id()), 500);
        assert_eq!(g.invalidations_to_others(), 500);
    }
}
