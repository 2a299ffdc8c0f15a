//! Progress reporting service
//!
//! Progress is reported per SUCCESS, not per attempt: a run that skips many
//! broken candidates still advances only when a sample is actually persisted.
//! The trait seam lets the pipeline stay silent under test.

use crate::partition::Partition;
use crate::pipeline::RunReport;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives pipeline progress events
pub trait ProgressReporter: Send + Sync {
    /// A run is starting with the given success target
    fn report_started(&self, target_total: u64);

    /// One sample was persisted with the given global success index
    fn report_success(&self, index: u64, partition: Partition);

    /// The run finished; `report` carries the outcome and final counts
    fn report_finished(&self, report: &RunReport);
}

/// Progress reporter that discards all events
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_started(&self, _target_total: u64) {}

    fn report_success(&self, _index: u64, _partition: Partition) {}

    fn report_finished(&self, _report: &RunReport) {}
}

/// Console reporter backed by an indicatif bar over the success count
pub struct ConsoleProgressReporter {
    bar: ProgressBar,
}

impl ConsoleProgressReporter {
    /// Create a reporter; the bar stays hidden until the run starts
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_started(&self, target_total: u64) {
        self.bar.set_length(target_total);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.set_message("downloading");
    }

    fn report_success(&self, _index: u64, partition: Partition) {
        self.bar.set_message(format!("-> {}", partition));
        self.bar.inc(1);
    }

    fn report_finished(&self, report: &RunReport) {
        let summary = format!(
            "train {}, test {}, validation {}",
            report.train, report.test, report.validation
        );
        if report.met_target() {
            self.bar.finish_with_message(format!("✅ {}", summary));
        } else {
            self.bar.abandon_with_message(format!(
                "⚠️ short of target ({} of {}): {}",
                report.total_saved(),
                report.requested,
                summary
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RunOutcome;

    fn sample_report() -> RunReport {
        RunReport {
            outcome: RunOutcome::Completed,
            train: 9,
            test: 0,
            validation: 1,
            attempts: 12,
            requested: 10,
        }
    }

    #[test]
    fn test_no_op_reporter_discards_everything() {
        let reporter = NoOpProgressReporter;
        reporter.report_started(10);
        reporter.report_success(0, Partition::Train);
        reporter.report_finished(&sample_report());
    }

    #[test]
    fn test_console_reporter_full_cycle() {
        let reporter = ConsoleProgressReporter::new();
        reporter.report_started(10);
        for i in 0..10 {
            reporter.report_success(i, Partition::Train);
        }
        reporter.report_finished(&sample_report());
    }

    #[test]
    fn test_trait_object_safety() {
        let reporters: Vec<Box<dyn ProgressReporter>> = vec![
            Box::new(NoOpProgressReporter),
            Box::new(ConsoleProgressReporter::new()),
        ];
        for reporter in reporters {
            reporter.report_started(1);
            reporter.report_success(0, Partition::Validation);
        }
    }
}
