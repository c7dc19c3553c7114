//! rageval CLI - score retrieval predictions against annotated solutions
//!
//! Usage:
//!   rageval --pred predictions.json --sol solution.json
//!   rageval --pred p.json --sol s.json -k 1,3,5 --metrics NDCG,MRR
//!   rageval --pred p.json --sol s.json --format table

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::*;
use rageval::{
    evaluate, parse_cutoffs, parse_metrics, parse_prediction, parse_solution, require_json_path,
    EvaluationConfigBuilder, ShortfallPolicy,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rageval")]
#[command(about = "rageval - Retrieval evaluation for RAG pipelines")]
#[command(version)]
struct Cli {
    /// Prediction file (.json): query id -> {"paragraphs": [...]}
    #[arg(long)]
    pred: PathBuf,

    /// Solution file (.json): query id -> {"evidence": [...]}
    #[arg(long)]
    sol: PathBuf,

    /// Comma-separated cutoffs
    #[arg(short, long, env = "RAGEVAL_K", default_value = "1,5,10")]
    k: String,

    /// Comma-separated subset of metrics (default: all)
    #[arg(short, long, env = "RAGEVAL_METRICS")]
    metrics: Option<String>,

    /// Stop scoring a cutoff at the first query with fewer candidates than k
    #[arg(long)]
    stop_on_shortfall: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "dict")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Dict,
    Json,
    Table,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    require_json_path(&cli.pred)?;
    require_json_path(&cli.sol)?;

    let mut builder = EvaluationConfigBuilder::new().cutoffs(parse_cutoffs(&cli.k)?);
    if let Some(metrics) = &cli.metrics {
        builder = builder.metrics(parse_metrics(metrics)?);
    }
    if cli.stop_on_shortfall {
        builder = builder.shortfall(ShortfallPolicy::Stop);
    }
    let config = builder.build()?;

    let prediction = parse_prediction(&read_json(&cli.pred).await?)
        .with_context(|| format!("failed parsing predictions '{}'", cli.pred.display()))?;
    let solution = parse_solution(&read_json(&cli.sol).await?)
        .with_context(|| format!("failed parsing solution '{}'", cli.sol.display()))?;

    let eval = evaluate(&solution, &prediction, &config)?;

    match cli.format {
        OutputFormat::Dict => println!("{}", eval.report),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "generated_at_utc": chrono::Utc::now().to_rfc3339(),
                "cutoffs": config.cutoffs,
                "queries_evaluated": eval.report.queries_evaluated,
                "scores": eval.report,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            println!("{}", "Retrieval Evaluation".bold().underline());
            println!(
                "  {} solution queries, {} predictions",
                solution.len().to_string().cyan(),
                prediction.len().to_string().cyan()
            );
            println!();
            print!("{}", eval.report.to_table());
        }
    }

    Ok(())
}

async fn read_json(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed reading '{}'", path.display()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "rageval=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
