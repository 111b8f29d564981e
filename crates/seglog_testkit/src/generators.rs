//! Property-based test generators using proptest.
//!
//! Provides strategies for generating ledger operations and a sequential
//! reference model that a [`JournalFile`] must agree with after the same
//! operations are applied.

use proptest::prelude::*;
use seglog_core::{FileId, JournalFile};
use std::collections::BTreeMap;

/// A single mutation of a file ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Take a live reference.
    IncrementLive,
    /// Drop a live reference.
    DecrementLive,
    /// Add live bytes.
    AddBytes(u32),
    /// Remove live bytes.
    RemoveBytes(u32),
    /// Record an invalidation against a target file.
    Invalidate(FileId),
    /// Set the reclaim flag.
    SetReclaimable(bool),
}

impl LedgerOperation {
    /// Applies the operation to a ledger.
    pub fn apply(&self, ledger: &JournalFile) {
        match self {
            Self::IncrementLive => ledger.increment_live(),
            Self::DecrementLive => ledger.decrement_live(),
            Self::AddBytes(bytes) => ledger.add_live_bytes(*bytes),
            Self::RemoveBytes(bytes) => ledger.remove_live_bytes(*bytes),
            Self::Invalidate(target) => ledger.record_invalidation(*target),
            Self::SetReclaimable(value) => ledger.set_reclaimable(*value),
        }
    }
}

/// Strategy for generating ledger operations against targets
/// `1..=max_target`.
pub fn ledger_operation_strategy(max_target: u64) -> impl Strategy<Value = LedgerOperation> {
    prop_oneof![
        3 => Just(LedgerOperation::IncrementLive),
        2 => Just(LedgerOperation::DecrementLive),
        3 => (0u32..4096).prop_map(LedgerOperation::AddBytes),
        2 => (0u32..4096).prop_map(LedgerOperation::RemoveBytes),
        3 => (1..=max_target).prop_map(|id| LedgerOperation::Invalidate(FileId::new(id))),
        1 => any::<bool>().prop_map(LedgerOperation::SetReclaimable),
    ]
}

/// Strategy for generating a sequence of ledger operations.
pub fn ledger_operations_strategy(
    max_target: u64,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<LedgerOperation>> {
    prop::collection::vec(ledger_operation_strategy(max_target), min_ops..max_ops)
}

/// Sequential reference model of a file ledger.
#[derive(Debug, Clone)]
pub struct LedgerModel {
    file_id: FileId,
    live_count: i64,
    live_bytes: i64,
    invalidations: BTreeMap<FileId, u32>,
    reclaimable: bool,
}

impl LedgerModel {
    /// Creates a model of an empty ledger for `file_id`.
    #[must_use]
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            live_count: 0,
            live_bytes: 0,
            invalidations: BTreeMap::new(),
            reclaimable: false,
        }
    }

    /// Applies the operation to the model.
    pub fn apply(&mut self, operation: &LedgerOperation) {
        match operation {
            LedgerOperation::IncrementLive => self.live_count += 1,
            LedgerOperation::DecrementLive => self.live_count -= 1,
            LedgerOperation::AddBytes(bytes) => self.live_bytes += i64::from(*bytes),
            LedgerOperation::RemoveBytes(bytes) => self.live_bytes -= i64::from(*bytes),
            LedgerOperation::Invalidate(target) => {
                *self.invalidations.entry(*target).or_insert(0) += 1;
            }
            LedgerOperation::SetReclaimable(value) => self.reclaimable = *value,
        }
    }

    /// Returns the expected invalidations against other files.
    #[must_use]
    pub fn invalidations_to_others(&self) -> u32 {
        self.invalidations
            .iter()
            .filter(|(target, _)| **target != self.file_id)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Checks that `ledger` agrees with the model.
    ///
    /// Returns a description of the first mismatch.
    pub fn verify(&self, ledger: &JournalFile) -> Result<(), String> {
        if i64::from(ledger.live_count()) != self.live_count {
            return Err(format!(
                "live count: expected {}, got {}",
                self.live_count,
                ledger.live_count()
            ));
        }
        if ledger.live_bytes() != self.live_bytes {
            return Err(format!(
                "live bytes: expected {}, got {}",
                self.live_bytes,
                ledger.live_bytes()
            ));
        }
        if ledger.invalidations_to_others() != self.invalidations_to_others() {
            return Err(format!(
                "invalidations to others: expected {}, got {}",
                self.invalidations_to_others(),
                ledger.invalidations_to_others()
            ));
        }
        let expected: Vec<_> = self
            .invalidations
            .iter()
            .map(|(target, count)| (*target, *count))
            .collect();
        if ledger.invalidation_targets() != expected {
            return Err(format!(
                "invalidation targets: expected {expected:?}, got {:?}",
                ledger.invalidation_targets()
            ));
        }
        if ledger.is_reclaimable() != self.reclaimable {
            return Err(format!(
                "reclaimable: expected {}, got {}",
                self.reclaimable,
                ledger.is_reclaimable()
            ));
        }
        Ok(())
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_storage::InMemorySequentialFile;

    fn ledger(id: u64) -> JournalFile {
        JournalFile::new(
            Box::new(InMemorySequentialFile::new(format!("seglog-{id}.log"))),
            FileId::new(id),
            1,
        )
    }

    #[test]
    fn model_detects_mismatch() {
        let file = ledger(1);
        let mut model = LedgerModel::new(FileId::new(1));
        model.apply(&LedgerOperation::IncrementLive);

        let err = model.verify(&file).unwrap_err();
        assert!(err.starts_with("live count"));
    }

    proptest! {
        #![proptest_config(PropTestConfig::default().to_proptest_config())]

        #[test]
        fn ledger_agrees_with_model(operations in ledger_operations_strategy(5, 0, 200)) {
            let file = ledger(3);
            let mut model = LedgerModel::new(FileId::new(3));

            for operation in &operations {
                operation.apply(&file);
                model.apply(operation);
            }

            prop_assert_eq!(model.verify(&file), Ok(()));
        }

        #[test]
        fn unqueried_targets_stay_absent(operations in ledger_operations_strategy(4, 0, 64)) {
            let file = ledger(1);
            for operation in &operations {
                operation.apply(&file);
            }

            prop_assert_eq!(file.invalidation_count(FileId::new(100)), 0);
            prop_assert!(!file.describe_invalidations().contains("file:100"));
        }
    }
}
