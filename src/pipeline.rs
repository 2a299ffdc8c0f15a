//! The acquisition pipeline driver
//!
//! Pulls candidates from a [`SampleSource`] up to a bounded budget, routes
//! each through fetch-and-decode and the square crop, feeds successes to the
//! partition allocator, persists the result, and stops exactly when the
//! global target is met. Per-candidate failures are absorbed here and never
//! propagate further; only a dead upstream or output-tree I/O aborts a run.

use crate::config::CurateConfig;
use crate::crop::crop_to_square;
use crate::error::Result;
use crate::fetch::CandidateFetcher;
use crate::partition::{PartitionState, PartitionTarget};
use crate::services::io::{ImageStore, OutputLayout};
use crate::services::progress::ProgressReporter;
use crate::source::SampleSource;
use serde::Serialize;
use tracing::{info, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The global target was met
    Completed,
    /// The candidate budget (or the upstream itself) ran out first
    Exhausted,
}

/// Final per-partition counts for a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Terminal state of the run
    pub outcome: RunOutcome,
    /// Samples persisted to the training partition
    pub train: u64,
    /// Samples persisted to the testing partition
    pub test: u64,
    /// Samples persisted to the validation partition
    pub validation: u64,
    /// Candidates examined, successful or not
    pub attempts: u64,
    /// The global target the run was asked for
    pub requested: u64,
}

impl RunReport {
    /// Total samples persisted across all partitions
    #[must_use]
    pub fn total_saved(&self) -> u64 {
        self.train + self.test + self.validation
    }

    /// Whether the run met its target
    #[must_use]
    pub fn met_target(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    /// Samples missing relative to the target
    #[must_use]
    pub fn shortfall(&self) -> u64 {
        self.requested.saturating_sub(self.total_saved())
    }
}

/// Drives one curation run from candidate stream to persisted split tree
pub struct CurationPipeline<S, F> {
    config: CurateConfig,
    target: PartitionTarget,
    layout: OutputLayout,
    source: S,
    fetcher: F,
    reporter: Box<dyn ProgressReporter>,
}

impl<S: SampleSource, F: CandidateFetcher> CurationPipeline<S, F> {
    /// Assemble a pipeline from a validated configuration and collaborators
    pub fn new(
        config: CurateConfig,
        source: S,
        fetcher: F,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<Self> {
        config.validate()?;
        let target = PartitionTarget::from_ratios(
            config.target_count,
            config.train_ratio,
            config.test_ratio,
        )?;
        let layout = OutputLayout::from_config(&config);

        Ok(Self {
            config,
            target,
            layout,
            source,
            fetcher,
            reporter,
        })
    }

    /// The partition targets this run will fill
    #[must_use]
    pub fn target(&self) -> PartitionTarget {
        self.target
    }

    /// Run to completion or exhaustion.
    ///
    /// One candidate is fully processed before the next is pulled; all
    /// in-flight state for a failed candidate drops at the end of its
    /// iteration, leaving the partition counters untouched.
    pub async fn run(mut self) -> Result<RunReport> {
        let budget = self.config.budget();
        let mut state = PartitionState::new();
        let mut attempts: u64 = 0;

        info!(
            "Split: {} training, {} testing, {} validation",
            self.target.train, self.target.test, self.target.validation
        );
        self.reporter.report_started(self.target.total());

        while !state.is_complete(&self.target) && attempts < budget {
            let Some(record) = self.source.next_candidate().await? else {
                warn!("upstream stream ended after {} candidates", attempts);
                break;
            };
            attempts += 1;

            let image = match self.fetcher.fetch_and_decode(&record).await {
                Ok(image) => image,
                Err(failure) => {
                    warn!(url = %record.url, "skipping candidate: {}", failure);
                    continue;
                },
            };

            let square = crop_to_square(&image);

            // The global success index is the pre-increment total; assign
            // advances the counters, so read it first.
            let index = state.total_done();
            let partition = state.assign(&self.target);
            let path = self.layout.sample_path(partition, index);
            ImageStore::save_jpeg(&square, &path)?;

            self.reporter.report_success(index, partition);
        }

        let outcome = if state.is_complete(&self.target) {
            RunOutcome::Completed
        } else {
            RunOutcome::Exhausted
        };

        let report = RunReport {
            outcome,
            train: state.train_done(),
            test: state.test_done(),
            validation: state.val_done(),
            attempts,
            requested: self.target.total(),
        };

        match report.outcome {
            RunOutcome::Completed => {
                info!(
                    "Successfully downloaded and processed {} images ({} attempts)",
                    report.total_saved(),
                    report.attempts
                );
            },
            RunOutcome::Exhausted => {
                warn!(
                    "candidate budget exhausted: {} of {} requested samples after {} attempts; \
                     consider raising the budget multiplier",
                    report.total_saved(),
                    report.requested,
                    report.attempts
                );
            },
        }

        self.reporter.report_finished(&report);
        Ok(report)
    }
}
