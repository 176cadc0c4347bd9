//! CLI command definitions for shard-forge.
//!
//! - `generate` runs one generation and reports its outcome
//! - `list` shows the shard files in an output directory
//! - `show` prints one shard's record as JSON

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pipeline::{GenerationConfig, Orchestrator, Outcome, ProcessReport, DEFAULT_OUTPUT_DIR};
use crate::storage::OutputStore;

/// Shard count used when none (or zero) is requested.
const DEFAULT_MAX_FILES: usize = 10;

/// Synthetic record generator writing into a fixed set of shard files.
#[derive(Parser)]
#[command(name = "shard-forge")]
#[command(about = "Generate synthetic records into shard files with a parallel worker pool")]
#[command(version)]
#[command(
    long_about = "shard-forge synthesizes iterations * max-files records on a pool of workers and writes each one into shard (task mod max-files) as YAML.\n\nExample usage:\n  shard-forge generate --iterations 100 --max-workers 8 --max-files 10 --timeout-secs 60"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate records into the shard files.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// List the shard files in the output directory.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Print the record stored in one shard.
    Show(ShowArgs),
}

/// Arguments for `shard-forge generate`.
///
/// Options left unset fall back to the `SHARDGEN_*` environment variables,
/// then to the built-in defaults.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Passes over the full set of shards [default: 1].
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Number of concurrent workers [default: 4].
    #[arg(short = 'w', long)]
    pub max_workers: Option<usize>,

    /// Number of shard files; 0 selects the default of 10.
    #[arg(short = 'f', long)]
    pub max_files: Option<usize>,

    /// Deadline for the run in seconds [default: 30].
    #[arg(short = 't', long)]
    pub timeout_secs: Option<u64>,

    /// Output directory for shard files [default: ./generated-shards].
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `shard-forge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output directory to inspect.
    #[arg(short = 'o', long, env = "SHARDGEN_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `shard-forge show`.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Shard number to print.
    pub id: u64,

    /// Output directory to read from.
    #[arg(short = 'o', long, env = "SHARDGEN_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,
}

/// Summary of a `generate` run.
#[derive(Debug, Serialize)]
struct GenerateSummary {
    status: &'static str,
    run_id: String,
    iterations: usize,
    max_workers: usize,
    max_files: usize,
    elapsed_ms: u64,
    tasks_completed: u64,
    tasks_failed: u64,
    tasks_interrupted: u64,
    success_rate: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    worker_errors: Vec<String>,
}

impl GenerateSummary {
    fn new(config: &GenerationConfig, report: &ProcessReport) -> Self {
        let status = match report.outcome {
            Outcome::TimedOut => "timed_out",
            Outcome::Completed if report.errors.is_empty() => "success",
            Outcome::Completed => "partial_success",
        };

        Self {
            status,
            run_id: report.run_id.to_string(),
            iterations: config.iterations,
            max_workers: config.max_workers,
            max_files: config.max_files,
            elapsed_ms: report.elapsed.as_millis() as u64,
            tasks_completed: report.stats.tasks_completed,
            tasks_failed: report.stats.tasks_failed,
            tasks_interrupted: report.stats.tasks_interrupted,
            success_rate: report.stats.success_rate(),
            worker_errors: report.errors.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the selected command with already parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::List(args) => run_list_command(args).await,
        Commands::Show(args) => run_show_command(args).await,
    }
}

/// Applies CLI arguments on top of `base`.
///
/// A shard count of zero falls back to the default; zero iterations or
/// workers are rejected.
fn build_config(args: &GenerateArgs, base: GenerationConfig) -> anyhow::Result<GenerationConfig> {
    let mut config = base;

    if let Some(iterations) = args.iterations {
        if iterations == 0 {
            anyhow::bail!("Iterations must be positive");
        }
        config.iterations = iterations;
    }
    if let Some(max_workers) = args.max_workers {
        if max_workers == 0 {
            anyhow::bail!("Max workers must be positive");
        }
        config.max_workers = max_workers;
    }
    if let Some(max_files) = args.max_files {
        config.max_files = if max_files == 0 {
            DEFAULT_MAX_FILES
        } else {
            max_files
        };
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let base = GenerationConfig::from_env().context("Invalid SHARDGEN_* environment")?;
    let config = build_config(&args, base)?;
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                cancel.cancel();
            }
        })
    };

    let result = Orchestrator::new().process(&cancel, &config).await;
    interrupt.abort();

    let report = result.context("Generation failed")?;
    let summary = GenerateSummary::new(&config, &report);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Status:      {}", summary.status);
    println!("Run:         {}", summary.run_id);
    println!(
        "Tasks:       {} completed, {} failed, {} interrupted ({:.1}% success)",
        summary.tasks_completed,
        summary.tasks_failed,
        summary.tasks_interrupted,
        summary.success_rate
    );
    println!("Elapsed:     {} ms", summary.elapsed_ms);
    println!("Output:      {}", config.output_dir.display());
    if report.timed_out_before_completion() {
        println!("Deadline elapsed before all tasks finished; shard contents are undetermined.");
    }
    for err in &summary.worker_errors {
        println!("  error: {}", err);
    }

    Ok(())
}

async fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let store = OutputStore::new(&args.output);
    let files = store
        .list_outputs()
        .await
        .with_context(|| format!("Failed to list outputs in {}", args.output.display()))?;

    if args.json {
        let body = serde_json::json!({ "status": "success", "files": files });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if files.is_empty() {
        println!("No outputs in {}", args.output.display());
    } else {
        for name in &files {
            println!("{}", name);
        }
    }

    Ok(())
}

async fn run_show_command(args: ShowArgs) -> anyhow::Result<()> {
    let store = OutputStore::new(&args.output);
    let record = store.read_output(args.id).await?;
    info!(id = args.id, "Loaded output");

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
