//! Partition targets and run-scoped allocation state

use crate::error::{CurationError, Result};
use serde::{Deserialize, Serialize};

/// One of the three output partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// Training partition
    Train,
    /// Testing partition
    Test,
    /// Validation partition
    Validation,
}

impl Partition {
    /// Directory name of the partition under the output base
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Immutable per-partition sample counts for a run
///
/// Derived once at startup from the target count and fixed ratios. The train
/// and test counts are floor divisions of the target; validation absorbs the
/// remainder, so the three always sum to the target exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTarget {
    /// Samples to place in the training partition
    pub train: u64,
    /// Samples to place in the testing partition
    pub test: u64,
    /// Samples to place in the validation partition
    pub validation: u64,
}

impl PartitionTarget {
    /// Derive partition counts from a global target and fixed ratios.
    ///
    /// The ratios must sum to 1.0; that is validated by
    /// [`crate::config::CurateConfig::validate`] before a run, and checked
    /// again here for direct callers.
    pub fn from_ratios(count: u64, train_ratio: f64, test_ratio: f64) -> Result<Self> {
        let val_implied = 1.0 - train_ratio - test_ratio;
        if !(0.0..=1.0).contains(&train_ratio)
            || !(0.0..=1.0).contains(&test_ratio)
            || val_implied < -1e-9
        {
            return Err(CurationError::invalid_config(format!(
                "invalid partition ratios: train {}, test {}",
                train_ratio, test_ratio
            )));
        }

        let train = (count as f64 * train_ratio).floor() as u64;
        let test = (count as f64 * test_ratio).floor() as u64;
        let validation = count - train - test;

        Ok(Self {
            train,
            test,
            validation,
        })
    }

    /// Total sample count across all partitions
    #[must_use]
    pub fn total(&self) -> u64 {
        self.train + self.test + self.validation
    }
}

/// Mutable run-scoped allocation counters
///
/// Updated exactly once per successful candidate, strictly monotone, each
/// counter bounded by its [`PartitionTarget`] component. Owned by the single
/// pipeline driver; passed explicitly into [`PartitionState::assign`] rather
/// than living as ambient process state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionState {
    train_done: u64,
    test_done: u64,
    val_done: u64,
}

impl PartitionState {
    /// Create a fresh state with all counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Successes placed in the training partition so far
    #[must_use]
    pub fn train_done(&self) -> u64 {
        self.train_done
    }

    /// Successes placed in the testing partition so far
    #[must_use]
    pub fn test_done(&self) -> u64 {
        self.test_done
    }

    /// Successes placed in the validation partition so far
    #[must_use]
    pub fn val_done(&self) -> u64 {
        self.val_done
    }

    /// Total successes so far; equals the next global success index
    #[must_use]
    pub fn total_done(&self) -> u64 {
        self.train_done + self.test_done + self.val_done
    }

    /// Whether the run target has been met
    #[must_use]
    pub fn is_complete(&self, target: &PartitionTarget) -> bool {
        self.total_done() >= target.total()
    }

    /// Decide the partition for the next successful sample and record it.
    ///
    /// Greedy fill against the CURRENT state: train until full, then test,
    /// then validation. Failed candidates never reach this call, so skipped
    /// failures consume no partition slot. Must be called in increasing
    /// global-success order and never after the target is met.
    pub fn assign(&mut self, target: &PartitionTarget) -> Partition {
        debug_assert!(
            self.total_done() < target.total(),
            "assign called after target met"
        );

        if self.train_done < target.train {
            self.train_done += 1;
            Partition::Train
        } else if self.test_done < target.test {
            self.test_done += 1;
            Partition::Test
        } else {
            self.val_done += 1;
            Partition::Validation
        }
    }
}
