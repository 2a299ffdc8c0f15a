//! Configuration types for dataset curation runs

use crate::error::{CurationError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tolerance when checking that the partition ratios sum to 1.0
const RATIO_SUM_EPSILON: f64 = 1e-9;

/// Configuration for a curation run
///
/// All values are startup constants: they are fixed when the run begins and
/// never change mid-run. The CLI exposes them as flags whose defaults are the
/// values of the standard acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurateConfig {
    /// Total number of samples to acquire across all partitions
    pub target_count: u64,

    /// Fraction of the target assigned to the training partition
    pub train_ratio: f64,

    /// Fraction of the target assigned to the testing partition
    pub test_ratio: f64,

    /// Fraction of the target assigned to the validation partition
    pub val_ratio: f64,

    /// Candidate budget as a multiple of the target count
    ///
    /// The pipeline examines at most `target_count * budget_multiplier`
    /// upstream candidates before giving up on reaching the target.
    pub budget_multiplier: u64,

    /// Timeout applied to each per-candidate HTTP fetch
    pub fetch_timeout: Duration,

    /// Size of the look-ahead shuffle window over the upstream stream
    pub shuffle_window: usize,

    /// Seed for the shuffle window, fixed for reproducibility
    pub seed: u64,

    /// Root directory of the output split tree
    pub base_dir: PathBuf,

    /// Class label directory under each split
    pub class_label: String,

    /// Filename prefix for persisted samples
    pub file_prefix: String,

    /// Upstream dataset identifier (e.g. "laion/laion400m")
    pub dataset: String,

    /// Upstream dataset configuration name
    pub dataset_config: String,

    /// Upstream dataset split to stream from
    pub dataset_split: String,

    /// Number of rows requested per upstream page
    pub page_size: usize,
}

impl Default for CurateConfig {
    fn default() -> Self {
        Self {
            target_count: 300,
            train_ratio: 0.9,
            test_ratio: 0.05,
            val_ratio: 0.05,
            budget_multiplier: 3,
            fetch_timeout: Duration::from_secs(10),
            shuffle_window: 1000,
            seed: 42,
            base_dir: PathBuf::from("ISIC-images-split"),
            class_label: "random".to_string(),
            file_prefix: "RANDOM".to_string(),
            dataset: "laion/laion400m".to_string(),
            dataset_config: "default".to_string(),
            dataset_split: "train".to_string(),
            page_size: 100,
        }
    }
}

impl CurateConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> CurateConfigBuilder {
        CurateConfigBuilder::default()
    }

    /// Maximum number of candidates the pipeline will examine
    #[must_use]
    pub fn budget(&self) -> u64 {
        self.target_count.saturating_mul(self.budget_multiplier)
    }

    /// Validate all configuration parameters
    ///
    /// The ratios must sum to 1.0, the target must be positive, and the
    /// budget multiplier and shuffle window must be at least 1.
    pub fn validate(&self) -> Result<()> {
        if self.target_count == 0 {
            return Err(CurationError::invalid_config(
                "target count must be positive",
            ));
        }

        for (name, ratio) in [
            ("train", self.train_ratio),
            ("test", self.test_ratio),
            ("validation", self.val_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(CurationError::invalid_config(format!(
                    "{} ratio {} outside 0.0-1.0",
                    name, ratio
                )));
            }
        }

        let sum = self.train_ratio + self.test_ratio + self.val_ratio;
        if (sum - 1.0).abs() > RATIO_SUM_EPSILON {
            return Err(CurationError::invalid_config(format!(
                "partition ratios must sum to 1.0, got {}",
                sum
            )));
        }

        if self.budget_multiplier == 0 {
            return Err(CurationError::invalid_config(
                "budget multiplier must be at least 1",
            ));
        }

        if self.shuffle_window == 0 {
            return Err(CurationError::invalid_config(
                "shuffle window must be at least 1",
            ));
        }

        if self.page_size == 0 {
            return Err(CurationError::invalid_config(
                "page size must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Builder for [`CurateConfig`]
#[derive(Debug, Default)]
pub struct CurateConfigBuilder {
    config: CurateConfig,
}

impl CurateConfigBuilder {
    /// Set the total target count
    #[must_use]
    pub fn target_count(mut self, count: u64) -> Self {
        self.config.target_count = count;
        self
    }

    /// Set the train/test/validation ratios
    #[must_use]
    pub fn ratios(mut self, train: f64, test: f64, val: f64) -> Self {
        self.config.train_ratio = train;
        self.config.test_ratio = test;
        self.config.val_ratio = val;
        self
    }

    /// Set the candidate budget multiplier
    #[must_use]
    pub fn budget_multiplier(mut self, multiplier: u64) -> Self {
        self.config.budget_multiplier = multiplier;
        self
    }

    /// Set the per-candidate fetch timeout
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the shuffle window size
    #[must_use]
    pub fn shuffle_window(mut self, window: usize) -> Self {
        self.config.shuffle_window = window;
        self
    }

    /// Set the shuffle seed
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the output base directory
    #[must_use]
    pub fn base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.base_dir = dir.into();
        self
    }

    /// Set the class label directory name
    #[must_use]
    pub fn class_label<S: Into<String>>(mut self, label: S) -> Self {
        self.config.class_label = label.into();
        self
    }

    /// Set the persisted filename prefix
    #[must_use]
    pub fn file_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Set the upstream dataset identifier
    #[must_use]
    pub fn dataset<S: Into<String>>(mut self, dataset: S) -> Self {
        self.config.dataset = dataset.into();
        self
    }

    /// Set the upstream dataset configuration name
    #[must_use]
    pub fn dataset_config<S: Into<String>>(mut self, config: S) -> Self {
        self.config.dataset_config = config.into();
        self
    }

    /// Set the upstream dataset split
    #[must_use]
    pub fn dataset_split<S: Into<String>>(mut self, split: S) -> Self {
        self.config.dataset_split = split.into();
        self
    }

    /// Set the upstream page size
    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CurateConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
