#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
//! `logratio` CLI - per-user, per-endpoint error ratios for huge access logs
//!
//! Usage:
//!   `logratio ./access.log ./report.tsv`
//!   `logratio ./access.log ./report.tsv --rows cross-product --storage dense`
//!   `logratio generate ./access.log --lines 1000000`

mod aggregate;
mod generate;
mod progress;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use logratio_core::{AggregatorConfig, LoggingConfig, RowSelection, StorageMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logratio")]
#[command(
    author,
    version,
    about = "logratio - error/success ratio per user and endpoint for very large access logs"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Access log to read
    input: Option<PathBuf>,

    /// Report file to write
    output: Option<PathBuf>,

    /// Configuration file path (default: ./logratio.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Which (user, endpoint) rows to emit
    #[arg(long, value_enum)]
    rows: Option<RowsArg>,

    /// Counter layout
    #[arg(long, value_enum)]
    storage: Option<StorageArg>,

    /// Rows buffered per write
    #[arg(long)]
    batch_size: Option<usize>,

    /// Decimal places for finite ratios
    #[arg(long)]
    precision: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// CLI row selection option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RowsArg {
    Observed,
    CrossProduct,
}

impl From<RowsArg> for RowSelection {
    fn from(r: RowsArg) -> Self {
        match r {
            RowsArg::Observed => RowSelection::Observed,
            RowsArg::CrossProduct => RowSelection::CrossProduct,
        }
    }
}

/// CLI storage option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageArg {
    Dense,
    Sparse,
}

impl From<StorageArg> for StorageMode {
    fn from(s: StorageArg) -> Self {
        match s {
            StorageArg::Dense => StorageMode::Dense,
            StorageArg::Sparse => StorageMode::Sparse,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic access log for testing
    Generate {
        /// Path of the log to create
        output: PathBuf,

        /// Number of lines
        #[arg(long, default_value = "100000")]
        lines: u64,

        /// Number of distinct users
        #[arg(long, default_value = "1000")]
        users: usize,

        /// Number of distinct endpoints
        #[arg(long, default_value = "50")]
        endpoints: usize,

        /// Probability that a line carries a non-2xx status
        #[arg(long, default_value = "0.1")]
        error_rate: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        Some(Commands::Generate {
            output,
            lines,
            users,
            endpoints,
            error_rate,
            seed,
        }) => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            let options = generate::GenerateOptions {
                lines,
                users,
                endpoints,
                error_rate,
                seed,
            };
            let stats = generate::generate_file(&output, &options)?;
            println!(
                "{} {} lines ({:.1} MB) to {}",
                "Generated".green().bold(),
                stats.lines,
                stats.bytes as f64 / (1024.0 * 1024.0),
                output.display()
            );
        }
        None => {
            let (Some(input), Some(output)) = (cli.input.clone(), cli.output.clone()) else {
                eprintln!("Usage: logratio <INPUT> <OUTPUT> or logratio generate <OUTPUT>");
                eprintln!("Try 'logratio --help' for more information.");
                std::process::exit(1);
            };

            let config = load_config(&cli)?;
            init_logging(&config.logging, cli.verbose)?;

            let outcome = aggregate::run(&input, &output, &config, !cli.no_progress)?;

            println!("\n{}", "Report Summary".green().bold());
            println!("  Lines:            {}", outcome.summary.counting.lines);
            println!("  Users:            {}", outcome.summary.users);
            println!("  Endpoints:        {}", outcome.summary.endpoints);
            println!("  Rows written:     {}", outcome.report.rows.to_string().green());
            if outcome.report.infinite_rows > 0 {
                println!(
                    "  Rows with inf:    {}",
                    outcome.report.infinite_rows.to_string().yellow()
                );
            }
            println!("  Duration:         {} ms", outcome.elapsed.as_millis());
            println!("  Throughput:       {:.1} MiB/s", outcome.summary.mib_per_sec());
            println!("  Report:           {}", output.display());
        }
    }

    Ok(())
}

/// Loads the configuration file, then applies command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<AggregatorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            AggregatorConfig::load_from_path(path)
        }
        None => AggregatorConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(rows) = cli.rows {
        config.report.rows = rows.into();
    }
    if let Some(storage) = cli.storage {
        config.pipeline.storage = storage.into();
    }
    if let Some(batch_size) = cli.batch_size {
        config.report.batch_size = batch_size;
    }
    if let Some(precision) = cli.precision {
        config.report.ratio_precision = Some(precision);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Logs go to stderr; `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
