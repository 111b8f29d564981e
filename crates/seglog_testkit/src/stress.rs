//! Stress tests for seglog.
//!
//! These harnesses hammer shared ledgers from many threads and report
//! how many operations completed.

use seglog_core::{FileId, JournalFile, RecordId, RecordTracker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations performed by each thread.
    pub operations_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Payload size of appended records in bytes.
    pub record_size: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations_per_thread: 10_000,
            threads: 8,
            record_size: 256,
        }
    }
}

impl StressConfig {
    /// Creates a small configuration for unit tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            operations_per_thread: 500,
            threads: 4,
            record_size: 64,
        }
    }

    /// Returns the total number of operations across all threads.
    #[must_use]
    pub fn total_operations(&self) -> usize {
        self.operations_per_thread * self.threads
    }
}

/// Every thread records invalidations against `target` in `file`,
/// racing on the first insert of the target's counter.
pub fn stress_concurrent_invalidations(
    file: &Arc<JournalFile>,
    target: FileId,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let file = Arc::clone(file);
            let ops = config.operations_per_thread;
            thread::spawn(move || {
                for _ in 0..ops {
                    file.record_invalidation(target);
                }
            })
        })
        .collect();

    let mut failed = 0usize;
    for handle in handles {
        if handle.join().is_err() {
            failed += config.operations_per_thread;
        }
    }

    StressTestResult::new(config.total_operations() - failed, failed, start.elapsed())
}

/// Every thread appends records into `data_file` and deletes each one
/// with a tombstone in `tombstone_file`, through a shared tracker.
///
/// After a clean run `data_file` has no live references or bytes and
/// `tombstone_file` holds one invalidation per record.
pub fn stress_append_and_delete(
    tracker: &Arc<RecordTracker>,
    data_file: &Arc<JournalFile>,
    tombstone_file: &Arc<JournalFile>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let tracker = Arc::clone(tracker);
            let data_file = Arc::clone(data_file);
            let tombstone_file = Arc::clone(tombstone_file);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let ops = config.operations_per_thread;
            let size = config.record_size;

            thread::spawn(move || {
                for i in 0..ops {
                    let id = RecordId::new((t * ops + i) as u64);
                    let result = tracker
                        .append_add(id, &data_file, size)
                        .and_then(|()| tracker.append_delete(id, &tombstone_file));

                    match result {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestJournal;

    #[test]
    fn concurrent_invalidations_lose_no_updates() {
        let journal = TestJournal::memory(2);
        let files = journal.registry.files();
        let config = StressConfig::quick();

        let result = stress_concurrent_invalidations(&files[1], files[0].file_id(), &config);

        assert_eq!(result.failed_ops, 0);
        let expected = config.total_operations() as u32;
        assert_eq!(files[1].invalidation_count(files[0].file_id()), expected);
        assert_eq!(files[1].invalidations_to_others(), expected);
    }

    #[test]
    fn concurrent_self_invalidations_skip_aggregate() {
        let journal = TestJournal::memory(1);
        let file = &journal.registry.files()[0];
        let config = StressConfig::quick();

        stress_concurrent_invalidations(file, file.file_id(), &config);

        assert_eq!(
            file.invalidation_count(file.file_id()),
            config.total_operations() as u32
        );
        assert_eq!(file.invalidations_to_others(), 0);
    }

    #[test]
    fn append_and_delete_drains_data_file() {
        let journal = TestJournal::memory(2);
        let files = journal.registry.files();
        let tracker = Arc::new(RecordTracker::new());
        let config = StressConfig::quick();

        let result = stress_append_and_delete(&tracker, &files[0], &files[1], &config);

        assert_eq!(result.successful_ops, config.total_operations());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(tracker.live_records(), 0);
        assert_eq!(files[0].live_count(), 0);
        assert_eq!(files[0].live_bytes(), 0);
        assert_eq!(
            files[1].invalidation_count(files[0].file_id()),
            config.total_operations() as u32
        );
    }

    #[test]
    fn drained_file_can_be_marked_and_removed() {
        let journal = TestJournal::memory(2);
        let files = journal.registry.files();
        let tracker = Arc::new(RecordTracker::new());

        stress_append_and_delete(&tracker, &files[0], &files[1], &StressConfig::quick());

        // The compaction authority's verdict, applied externally
        files[0].set_reclaimable(true);
        assert!(files[0].is_reclaimable());

        journal.registry.remove(files[0].file_id());
        assert_eq!(files[1].invalidations_to_others(), 0);
        assert!(files[1].describe_invalidations().is_empty());
    }
}
