//! Dataset curation CLI
//!
//! Subcommands mirror the three stages of building the dataset: `curate`
//! pulls and splits corpus samples, `augment` expands a finished split,
//! `faces` collects the generated-face patches. Every flag default is the
//! constant of the standard acquisition run.

use crate::augment::augment_split;
use crate::config::CurateConfig;
use crate::faces::{scrape_face_patches, FaceScrapeConfig};
use crate::fetch::HttpFetcher;
use crate::pipeline::CurationPipeline;
use crate::services::io::OutputLayout;
use crate::services::progress::ConsoleProgressReporter;
use crate::source::{LaionSource, ShuffledSource};
use crate::tracing_config::TracingConfig;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Dataset curation tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgcurate")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Download, square-crop, and split random corpus images
    Curate(CurateArgs),
    /// Apply offline augmentations to every image under a split
    Augment(AugmentArgs),
    /// Scrape generated face frames and fixed cheek patches
    Faces(FacesArgs),
}

/// Arguments for the `curate` subcommand
#[derive(Args)]
pub struct CurateArgs {
    /// Total number of samples to acquire across all partitions
    #[arg(long, default_value_t = 300)]
    pub count: u64,

    /// Fraction of the target assigned to training
    #[arg(long, default_value_t = 0.9)]
    pub train_ratio: f64,

    /// Fraction of the target assigned to testing
    #[arg(long, default_value_t = 0.05)]
    pub test_ratio: f64,

    /// Fraction of the target assigned to validation
    #[arg(long, default_value_t = 0.05)]
    pub val_ratio: f64,

    /// Candidate budget as a multiple of the target count
    #[arg(long, default_value_t = 3)]
    pub budget_multiplier: u64,

    /// Per-candidate fetch timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Look-ahead shuffle window size
    #[arg(long, default_value_t = 1000)]
    pub shuffle_window: usize,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output base directory
    #[arg(long, default_value = "ISIC-images-split")]
    pub base_dir: PathBuf,

    /// Class label directory under each split
    #[arg(long, default_value = "random")]
    pub class_label: String,

    /// Filename prefix for persisted samples
    #[arg(long, default_value = "RANDOM")]
    pub prefix: String,

    /// Upstream dataset identifier
    #[arg(long, default_value = "laion/laion400m")]
    pub dataset: String,

    /// Upstream dataset split to stream from
    #[arg(long, default_value = "train")]
    pub split: String,
}

/// Arguments for the `augment` subcommand
#[derive(Args)]
pub struct AugmentArgs {
    /// Split directory to augment
    #[arg(long, default_value = "ISIC-images-split/train")]
    pub dir: PathBuf,

    /// Seed for the randomized crop
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Arguments for the `faces` subcommand
#[derive(Args)]
pub struct FacesArgs {
    /// Number of frames to fetch
    #[arg(long, default_value_t = 10)]
    pub count: u32,

    /// Directory receiving frames and patches
    #[arg(long, default_value = "ISIC-images-split/clear_skin")]
    pub output_dir: PathBuf,

    /// Generator endpoint returning a fresh face per request
    #[arg(long, default_value = "https://thispersondoesnotexist.com/")]
    pub url: String,
}

/// CLI entry point
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingConfig::new()
        .with_verbosity(cli.verbose)
        .init()
        .context("Failed to initialize tracing")?;

    match cli.command {
        Command::Curate(args) => run_curate(args).await,
        Command::Augment(args) => run_augment(&args),
        Command::Faces(args) => run_faces(args).await,
    }
}

async fn run_curate(args: CurateArgs) -> Result<()> {
    let config = CurateConfig::builder()
        .target_count(args.count)
        .ratios(args.train_ratio, args.test_ratio, args.val_ratio)
        .budget_multiplier(args.budget_multiplier)
        .fetch_timeout(Duration::from_secs(args.timeout_secs))
        .shuffle_window(args.shuffle_window)
        .seed(args.seed)
        .base_dir(args.base_dir)
        .class_label(args.class_label)
        .file_prefix(args.prefix)
        .dataset(args.dataset)
        .dataset_split(args.split)
        .build()
        .context("Invalid configuration")?;

    let layout = OutputLayout::from_config(&config);
    layout
        .create_directories()
        .context("Failed to create output directories")?;

    info!(
        "Loading dataset {} ({} split), seed {}",
        config.dataset, config.dataset_split, config.seed
    );

    let upstream = LaionSource::new(&config)?;
    let source = ShuffledSource::new(upstream, config.shuffle_window, config.seed);
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let pipeline = CurationPipeline::new(
        config,
        source,
        fetcher,
        Box::new(ConsoleProgressReporter::new()),
    )?;

    let report = pipeline.run().await?;

    info!(
        "Final counts: {} training, {} testing, {} validation ({} attempts)",
        report.train, report.test, report.validation, report.attempts
    );
    if !report.met_target() {
        warn!(
            "Only {} of {} requested images were acquired; increase --budget-multiplier",
            report.total_saved(),
            report.requested
        );
    }

    Ok(())
}

fn run_augment(args: &AugmentArgs) -> Result<()> {
    let written = augment_split(&args.dir, args.seed)
        .with_context(|| format!("Failed to augment {}", args.dir.display()))?;
    info!("Wrote {} augmented files", written);
    Ok(())
}

async fn run_faces(args: FacesArgs) -> Result<()> {
    let config = FaceScrapeConfig {
        source_url: args.url,
        output_dir: args.output_dir,
        count: args.count,
        ..FaceScrapeConfig::default()
    };

    let saved = scrape_face_patches(&config)
        .await
        .context("Face scrape failed")?;
    info!("All images saved ({} frames)", saved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_curate_defaults() {
        let cli = Cli::try_parse_from(["imgcurate", "curate"]).unwrap();
        let Command::Curate(args) = cli.command else {
            panic!("expected curate subcommand");
        };
        assert_eq!(args.count, 300);
        assert_eq!(args.train_ratio, 0.9);
        assert_eq!(args.seed, 42);
        assert_eq!(args.timeout_secs, 10);
        assert_eq!(args.prefix, "RANDOM");
    }

    #[test]
    fn test_verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["imgcurate", "curate", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
