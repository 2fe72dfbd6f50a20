//! The `rembench analyze` command: describe a source image's difficulty.

use clap::Args;
use rembench_core::vision::ImageRef;
use rembench_core::{Bench, Config};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// URL of the image to analyze
    #[arg(required = true)]
    pub image_url: String,

    /// Vision API key (overrides config and environment)
    #[arg(long)]
    pub api_key: Option<String>,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    let bench = Bench::new(config)?;
    let scorer = bench.scorer(args.api_key.as_deref())?;

    tracing::info!("Analyzing {}", args.image_url);
    let analysis = scorer.analyze(ImageRef::Url(args.image_url)).await?;

    println!("{}", analysis.trim());
    Ok(())
}
