//! The `rembench tests` command: manage saved test records.

use clap::{Args, Subcommand, ValueEnum};
use rembench_core::{store, Bench, Config, TestStore};
use std::path::PathBuf;

/// Arguments for the `tests` command.
#[derive(Args, Debug)]
pub struct TestsArgs {
    #[command(subcommand)]
    pub command: TestsCommand,
}

/// Subcommands for test-record management.
#[derive(Subcommand, Debug)]
pub enum TestsCommand {
    /// List saved test records
    List,

    /// Delete a test record by id
    Delete {
        /// Record id to delete
        id: String,
    },

    /// Show aggregate statistics over saved records
    Stats {
        /// Aggregate locally instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Export saved records
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Supported export formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    /// One row per (test, provider) score
    Csv,
    /// Pretty-printed JSON array of records
    Json,
}

/// Execute the tests command.
pub async fn execute(args: TestsArgs, config: Config) -> anyhow::Result<()> {
    let bench = Bench::new(config)?;
    let store = bench
        .store()
        .ok_or_else(|| anyhow::anyhow!("No store configured; set store.base_url in config"))?;

    match args.command {
        TestsCommand::List => list(&store).await,
        TestsCommand::Delete { id } => {
            store.delete_test(&id).await?;
            println!("Deleted test record {id}");
            Ok(())
        }
        TestsCommand::Stats { local } => stats(&store, local).await,
        TestsCommand::Export { format, output } => export(&store, format, output).await,
    }
}

async fn list(store: &TestStore) -> anyhow::Result<()> {
    let records = store.list_tests().await?;
    if records.is_empty() {
        println!("No saved test records.");
        return Ok(());
    }

    println!("{:<12} {:<20} {:<16} {}", "ID", "Date", "Category", "Name");
    for record in &records {
        println!(
            "{:<12} {:<20} {:<16} {}",
            record.id,
            record.timestamp.chars().take(19).collect::<String>(),
            record.category,
            record.name
        );
    }
    println!("\n{} record(s)", records.len());
    Ok(())
}

async fn stats(store: &TestStore, local: bool) -> anyhow::Result<()> {
    let stats = if local {
        let records = store.list_tests().await?;
        store::compute_stats(&records)
    } else {
        store.get_stats().await?
    };

    println!("Total tests: {}", stats.total_tests);

    if !stats.by_category.is_empty() {
        println!("\nBy category:");
        let mut categories: Vec<_> = stats.by_category.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (category, count) in categories {
            println!("  {category:<24} {count}");
        }
    }

    if !stats.avg_scores.is_empty() {
        println!("\nAverage overall score per provider:");
        let mut providers: Vec<_> = stats.avg_scores.iter().collect();
        providers.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (provider_id, avg) in providers {
            println!("  {provider_id:<32} {avg:.2}");
        }
    }

    Ok(())
}

async fn export(
    store: &TestStore,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let records = store.list_tests().await?;
    let rendered = match format {
        ExportFormat::Csv => store::export_csv(&records),
        ExportFormat::Json => store::export_json(&records)?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Exported {} record(s) to {}", records.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
