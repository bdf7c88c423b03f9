//! Aggregation run: log file in, report file out.
//!
//! The report is written next to the destination as `<output>.partial` and
//! renamed into place only once every row has been flushed, so a failed run
//! never leaves a truncated report behind.

use anyhow::{Context, Result};
use logratio_core::{
    AggregationPipeline, AggregationSummary, AggregatorConfig, FileSource, ReportStats,
    ReportWriter,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::progress::BarProgress;

/// Result of a successful run.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: AggregationSummary,
    pub report: ReportStats,
    pub elapsed: Duration,
}

/// Aggregates `input` and writes the report to `output`.
pub fn run(
    input: &Path,
    output: &Path,
    config: &AggregatorConfig,
    show_progress: bool,
) -> Result<RunOutcome> {
    let start = Instant::now();

    let source = FileSource::new(input, config.pipeline.read_buffer_bytes)
        .with_context(|| format!("Failed to open input {}", input.display()))?;

    let progress = BarProgress::new(show_progress);
    let mut pipeline = AggregationPipeline::new(&config.pipeline);
    let summary = pipeline
        .run(&source, &progress)
        .with_context(|| format!("Failed to aggregate {}", input.display()))?;
    progress.finish();

    let partial = partial_path(output);
    let report = match publish_report(&partial, output, &pipeline, config) {
        Ok(report) => report,
        Err(e) => {
            discard_partial(&partial);
            return Err(e);
        }
    };

    info!(
        "Report written to {}: {} rows in {} batches",
        output.display(),
        report.rows,
        report.batches
    );

    Ok(RunOutcome {
        summary,
        report,
        elapsed: start.elapsed(),
    })
}

/// Writes the report to `partial`, then renames it to `output`.
fn publish_report(
    partial: &Path,
    output: &Path,
    pipeline: &AggregationPipeline,
    config: &AggregatorConfig,
) -> Result<ReportStats> {
    let report = write_report(partial, pipeline, config)?;
    fs::rename(partial, output)
        .with_context(|| format!("Failed to move report into {}", output.display()))?;
    Ok(report)
}

fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", partial.display(), e),
    }
}

fn write_report(
    path: &Path,
    pipeline: &AggregationPipeline,
    config: &AggregatorConfig,
) -> Result<ReportStats> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    let mut writer = ReportWriter::new(file, &config.report);
    let stats = writer
        .write_report(pipeline.users(), pipeline.interner())
        .context("Failed to write report")?;
    writer.into_inner().sync_all()?;
    Ok(stats)
}

/// `report.tsv` -> `report.tsv.partial`
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
