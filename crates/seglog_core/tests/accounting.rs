//! End-to-end accounting across the registry, tracker and ledgers.

use seglog_core::{FileId, JournalConfig, JournalFileRegistry, RecordId, RecordTracker};
use seglog_storage::InMemorySequentialFile;

fn registry_with(files: usize) -> JournalFileRegistry {
    let registry = JournalFileRegistry::new(JournalConfig::default());
    for _ in 0..files {
        let name = registry.file_name_for(registry.next_file_id());
        registry
            .create(Box::new(InMemorySequentialFile::new(name)))
            .unwrap();
    }
    registry
}

#[test]
fn tombstone_in_later_file_makes_earlier_file_a_candidate() {
    let registry = registry_with(2);
    let f = registry.get(FileId::new(1)).unwrap();
    let g = registry.get(FileId::new(2)).unwrap();
    let tracker = RecordTracker::new();

    tracker.append_add(RecordId::new(1), &f, 50).unwrap();
    assert_eq!(f.live_count(), 1);
    assert_eq!(f.live_bytes(), 50);

    tracker.append_delete(RecordId::new(1), &g).unwrap();
    assert_eq!(g.invalidation_count(f.file_id()), 1);
    assert_eq!(g.invalidations_to_others(), 1);
    assert_eq!(f.live_count(), 0);
    assert_eq!(f.live_bytes(), 0);

    // The ledger never flips the flag on its own
    assert!(!f.is_reclaimable());
    f.set_reclaimable(true);
    assert!(f.is_reclaimable());

    registry.remove(f.file_id());
    assert_eq!(g.invalidation_count(f.file_id()), 0);
    assert_eq!(g.invalidations_to_others(), 0);
}

#[test]
fn tombstone_after_removal_leaves_survivors_clean() {
    let registry = registry_with(2);
    let f = registry.get(FileId::new(1)).unwrap();
    let g = registry.get(FileId::new(2)).unwrap();
    let tracker = RecordTracker::new();

    tracker.append_add(RecordId::new(1), &f, 50).unwrap();
    registry.remove(f.file_id());

    tracker.append_delete(RecordId::new(1), &g).unwrap();
    assert_eq!(g.invalidation_count(f.file_id()), 0);
    assert_eq!(g.invalidations_to_others(), 0);
    assert_eq!(g.describe_invalidations(), "");
    assert!(!tracker.contains(RecordId::new(1)));
}

#[test]
fn replay_rebuilds_identical_counters() {
    enum Event {
        Add(u64, u64, u32),
        Update(u64, u64, u32),
        Delete(u64, u64),
    }

    let log = [
        Event::Add(1, 1, 100),
        Event::Add(2, 1, 40),
        Event::Update(1, 2, 10),
        Event::Add(3, 2, 70),
        Event::Delete(2, 2),
        Event::Delete(1, 3),
        Event::Add(4, 3, 5),
        Event::Delete(4, 3),
    ];

    let apply = |registry: &JournalFileRegistry, tracker: &RecordTracker| {
        for event in &log {
            match *event {
                Event::Add(record, file, size) => tracker
                    .append_add(RecordId::new(record), &registry.get(FileId::new(file)).unwrap(), size)
                    .unwrap(),
                Event::Update(record, file, size) => tracker
                    .append_update(RecordId::new(record), &registry.get(FileId::new(file)).unwrap(), size)
                    .unwrap(),
                Event::Delete(record, file) => tracker
                    .append_delete(RecordId::new(record), &registry.get(FileId::new(file)).unwrap())
                    .unwrap(),
            }
        }
    };

    let live = registry_with(3);
    let live_tracker = RecordTracker::new();
    apply(&live, &live_tracker);

    // Startup: adopt the persisted files and replay the same log
    let replayed = JournalFileRegistry::new(JournalConfig::default());
    for id in [3u64, 1, 2] {
        replayed
            .adopt(
                Box::new(InMemorySequentialFile::new(replayed.file_name_for(FileId::new(id)))),
                FileId::new(id),
                1,
            )
            .unwrap();
    }
    let replay_tracker = RecordTracker::new();
    apply(&replayed, &replay_tracker);

    assert_eq!(live.snapshots(), replayed.snapshots());
    for (a, b) in live.files().iter().zip(replayed.files().iter()) {
        assert_eq!(a.describe_invalidations(), b.describe_invalidations());
    }
    assert_eq!(live_tracker.live_records(), 1);
    assert!(replay_tracker.contains(RecordId::new(3)));

    let first = replayed.get(FileId::new(1)).unwrap();
    assert_eq!(first.live_count(), 0);
    assert_eq!(first.live_bytes(), 0);

    let third = replayed.get(FileId::new(3)).unwrap();
    // Record 1 was superseded into file 2 before its tombstone landed
    assert_eq!(third.invalidation_count(FileId::new(1)), 0);
    assert_eq!(third.invalidation_count(FileId::new(2)), 1);
    assert_eq!(third.invalidation_count(FileId::new(3)), 1);
    assert_eq!(third.invalidations_to_others(), 1);

    let second = replayed.get(FileId::new(2)).unwrap();
    assert_eq!(second.invalidation_count(FileId::new(1)), 2);
    assert_eq!(second.live_count(), 1);
    assert_eq!(second.live_bytes(), 70);
    assert_eq!(replayed.next_file_id(), FileId::new(4));
}
