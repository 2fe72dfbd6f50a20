//! The `rembench score` command: judge one result in isolation.

use clap::Args;
use rembench_core::vision::ImageRef;
use rembench_core::{Bench, Config};

/// Arguments for the `score` command.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// URL of the background-removal result to score
    #[arg(required = true)]
    pub result_url: String,

    /// Label to attribute the result to (e.g., a provider id)
    #[arg(short, long, default_value = "result")]
    pub label: String,

    /// Vision API key (overrides config and environment)
    #[arg(long)]
    pub api_key: Option<String>,
}

/// Execute the score command.
pub async fn execute(args: ScoreArgs, config: Config) -> anyhow::Result<()> {
    let bench = Bench::new(config)?;
    let scorer = bench.scorer(args.api_key.as_deref())?;

    tracing::info!("Scoring {} as {}", args.result_url, args.label);
    let scores = scorer
        .score_single(ImageRef::Url(args.result_url), &args.label)
        .await?;

    println!("{}: {}", args.label, super::format_scores(&scores));
    Ok(())
}
