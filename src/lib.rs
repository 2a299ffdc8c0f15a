#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # imgcurate
//!
//! Curates an image dataset by pulling samples from a remote large-scale
//! corpus, normalizing them to a centered square crop, and distributing them
//! across fixed train/test/validation partitions.
//!
//! The acquisition pipeline tolerates a high, variable upstream failure rate:
//! broken links, timeouts, and undecodable payloads each cost one candidate,
//! never the run. Partition slots are assigned in success order, so the final
//! split adheres exactly to the configured ratios regardless of which
//! candidates happened to fail.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgcurate::{
//!     CurateConfig, CurationPipeline, HttpFetcher, LaionSource,
//!     NoOpProgressReporter, ShuffledSource,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CurateConfig::builder()
//!     .target_count(300)
//!     .ratios(0.9, 0.05, 0.05)
//!     .build()?;
//!
//! let upstream = LaionSource::new(&config)?;
//! let source = ShuffledSource::new(upstream, config.shuffle_window, config.seed);
//! let fetcher = HttpFetcher::new(config.fetch_timeout)?;
//!
//! let pipeline =
//!     CurationPipeline::new(config, source, fetcher, Box::new(NoOpProgressReporter))?;
//! let report = pipeline.run().await?;
//! println!("saved {} images", report.total_saved());
//! # Ok(())
//! # }
//! ```
//!
//! The candidate stream and the per-candidate fetcher are trait seams
//! ([`SampleSource`], [`CandidateFetcher`]), so the driver can be exercised
//! against deterministic in-memory stand-ins without a live network.

pub mod augment;
pub mod cli;
pub mod config;
pub mod crop;
pub mod error;
pub mod faces;
pub mod fetch;
pub mod partition;
pub mod pipeline;
pub mod services;
pub mod source;
pub mod tracing_config;

// Public API exports
pub use augment::{augment_split, Augmentation};
pub use config::{CurateConfig, CurateConfigBuilder};
pub use crop::crop_to_square;
pub use error::{CurationError, Result};
pub use faces::{scrape_face_patches, FaceScrapeConfig};
pub use fetch::{CandidateFetcher, HttpFetcher, SampleFailure};
pub use partition::{Partition, PartitionState, PartitionTarget};
pub use pipeline::{CurationPipeline, RunOutcome, RunReport};
pub use services::{
    ConsoleProgressReporter, ImageStore, NoOpProgressReporter, OutputLayout, ProgressReporter,
};
pub use source::{CandidateRecord, LaionSource, SampleSource, ShuffledSource};
pub use tracing_config::TracingConfig;
