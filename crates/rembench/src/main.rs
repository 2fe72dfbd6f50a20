//! rembench CLI - compare background-removal providers and score their output.
//!
//! Fans one image out to several background-removal models, polls each
//! job to completion, and optionally has a vision model judge the
//! results. Comparison runs can be saved to a test-record backend for
//! later aggregation.
//!
//! # Usage
//!
//! ```bash
//! # Compare the default provider catalog on one image
//! rembench compare https://example.com/cat.png
//!
//! # Compare a subset and score the results comparatively
//! rembench compare https://example.com/cat.png \
//!     --providers bria/remove-background,cjwbw/rembg --score
//!
//! # Analyze an image's removal difficulty
//! rembench analyze https://example.com/cat.png
//!
//! # Saved-test management
//! rembench tests list
//! rembench tests export --format csv
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// rembench - compare background-removal providers and score their output.
#[derive(Parser, Debug)]
#[command(name = "rembench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one image through every provider and collect results
    Compare(cli::compare::CompareArgs),

    /// Analyze a source image for background-removal difficulty
    Analyze(cli::analyze::AnalyzeArgs),

    /// Score a single background-removal result
    Score(cli::score::ScoreArgs),

    /// Manage saved test records
    Tests(cli::tests::TestsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to stderr.
    let config = match rembench_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `rembench config path`."
            );
            rembench_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("rembench v{}", rembench_core::VERSION);

    match cli.command {
        Commands::Compare(args) => cli::compare::execute(args, config).await,
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Score(args) => cli::score::execute(args, config).await,
        Commands::Tests(args) => cli::tests::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
