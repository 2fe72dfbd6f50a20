//! The `rembench compare` command: fan one image out to providers.

use clap::Args;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rembench_core::poller::CancelFlag;
use rembench_core::types::{JobStatus, TestRecord};
use rembench_core::{Bench, Config};
use std::collections::HashMap;
use std::time::Duration;

/// Arguments for the `compare` command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// URL of the source image to run through each provider
    #[arg(required = true)]
    pub image_url: String,

    /// Comma-separated provider ids (defaults to the full catalog)
    #[arg(short, long, value_delimiter = ',')]
    pub providers: Vec<String>,

    /// Replicate API token (overrides config and environment)
    #[arg(long, env = "REPLICATE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Score the succeeded results comparatively with the vision model
    #[arg(long)]
    pub score: bool,

    /// Save the run as a test record
    #[arg(long)]
    pub save: bool,

    /// Test category for the saved record
    #[arg(long, default_value = "uncategorized")]
    pub category: String,

    /// Test name for the saved record
    #[arg(long)]
    pub name: Option<String>,

    /// Free-form notes for the saved record
    #[arg(long, default_value = "")]
    pub notes: String,
}

/// Execute the compare command.
pub async fn execute(args: CompareArgs, config: Config) -> anyhow::Result<()> {
    let bench = Bench::new(config)?;

    let providers = if args.providers.is_empty() {
        bench.removal_providers(args.api_key.as_deref())?
    } else {
        bench.removal_providers_for(&args.providers, args.api_key.as_deref())?
    };
    let provider_ids: Vec<String> = providers.iter().map(|p| p.id().to_string()).collect();

    tracing::info!(
        "Comparing {} provider(s) on {}",
        providers.len(),
        args.image_url
    );

    // Ctrl-C flips the cancel flag; in-flight pipelines finish as Canceled.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling comparison");
                cancel.cancel();
            }
        });
    }

    let (_multi, bars) = create_progress_bars(&provider_ids);
    let report = {
        let bars = bars.clone();
        bench
            .comparison()
            .run(&args.image_url, providers, cancel, move |id, job| {
                if let Some(bar) = bars.get(id) {
                    bar.set_message(job.status.to_string());
                    if job.status.is_terminal() {
                        bar.finish_with_message(match job.status {
                            JobStatus::Succeeded => "succeeded".to_string(),
                            JobStatus::Canceled => "canceled".to_string(),
                            _ => format!(
                                "failed: {}",
                                job.error.as_deref().unwrap_or("unknown error")
                            ),
                        });
                    }
                }
            })
            .await
    };
    for bar in bars.values() {
        if !bar.is_finished() {
            bar.finish_and_clear();
        }
    }

    print_report(&provider_ids, &report);

    let scores = if args.score {
        let candidates: Vec<(String, String)> = provider_ids
            .iter()
            .filter_map(|id| {
                report
                    .jobs
                    .get(id)
                    .filter(|job| job.status == JobStatus::Succeeded)
                    .and_then(|job| job.output.as_ref())
                    .and_then(|output| output.first_url())
                    .map(|url| (id.clone(), url.to_string()))
            })
            .collect();

        if candidates.is_empty() {
            tracing::warn!("No succeeded results to score");
            HashMap::new()
        } else {
            let scorer = bench.scorer(None)?;
            let scores = scorer.score_comparative(&candidates).await?;
            print_scores(&scores);
            scores
        }
    } else {
        HashMap::new()
    };

    if args.save {
        let store = bench
            .store()
            .ok_or_else(|| anyhow::anyhow!("No store configured; set store.base_url in config"))?;

        let record = TestRecord {
            id: String::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            category: args.category.clone(),
            name: args
                .name
                .clone()
                .unwrap_or_else(|| format!("compare {}", args.image_url)),
            notes: args.notes.clone(),
            image_url: args.image_url.clone(),
            image_analysis: None,
            results: report.jobs.clone(),
            scores,
            processing_times: report.processing_times.clone(),
        };
        let saved = store.persist_test(&record).await?;
        println!("\nSaved test record {}", saved.id);
    }

    Ok(())
}

/// One spinner per provider, stacked in a MultiProgress.
fn create_progress_bars(
    provider_ids: &[String],
) -> (MultiProgress, HashMap<String, ProgressBar>) {
    let multi = MultiProgress::new();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {prefix:<32} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let bars = provider_ids
        .iter()
        .map(|id| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(style.clone());
            bar.set_prefix(id.clone());
            bar.set_message("submitting");
            bar.enable_steady_tick(Duration::from_millis(120));
            (id.clone(), bar)
        })
        .collect();

    (multi, bars)
}

fn print_report(provider_ids: &[String], report: &rembench_core::ComparisonReport) {
    println!("\nResults:");
    for id in provider_ids {
        let Some(job) = report.jobs.get(id) else {
            continue;
        };
        let time = report
            .processing_times
            .get(id)
            .map(|t| format!("{t:.1}s"))
            .unwrap_or_else(|| "-".to_string());

        match job.status {
            JobStatus::Succeeded => {
                let url = job
                    .output
                    .as_ref()
                    .and_then(|o| o.first_url())
                    .unwrap_or("(no output url)");
                println!("  {id:<32} {time:>7}  {url}");
            }
            _ => {
                let detail = job.error.as_deref().unwrap_or("");
                println!("  {id:<32} {time:>7}  {} {detail}", job.status);
            }
        }
    }
}

fn print_scores(scores: &HashMap<String, rembench_core::ScoreSet>) {
    // Best first; provider id breaks ties so the order is stable.
    let mut ranked: Vec<_> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.overall.cmp(&a.1.overall).then(a.0.cmp(b.0)));

    println!("\nScores (vision model, * = fallback):");
    for (id, score_set) in ranked {
        println!("  {id:<32} {}", super::format_scores(score_set));
    }
}
