//! Dataset curation CLI entry point

use imgcurate::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
