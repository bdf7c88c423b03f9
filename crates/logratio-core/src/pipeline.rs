//! Two-pass aggregation over a log source.
//!
//! # Architecture
//!
//! ```text
//! pass 1 (sizing)    line -> UserTable::get_or_create(uid)
//!                         -> EndpointInterner::intern_or_lookup(endpoint)
//!                    EOF  -> UserTable::resize_all(endpoint_count)
//! pass 2 (counting)  line -> existing user, existing endpoint id
//!                         -> CounterSlot::record(is_error)
//! ```
//!
//! The counting pass never creates users or endpoint ids. Anything it cannot
//! resolve means the input changed between the two reads, which aborts the run.

use std::io::BufRead;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::interner::EndpointInterner;
use crate::line::LogRecord;
use crate::progress::{Pass, PassStats, ProgressObserver};
use crate::source::LogSource;
use crate::users::UserTable;

/// Progress callbacks fire at most once per this many bytes.
const PROGRESS_STRIDE: u64 = 1 << 20;

/// Outcome of a full two-pass run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationSummary {
    /// Sizing pass statistics.
    pub sizing: PassStats,
    /// Counting pass statistics.
    pub counting: PassStats,
    /// Distinct users.
    pub users: usize,
    /// Distinct endpoints.
    pub endpoints: usize,
    /// Counter slots allocated across all users.
    pub allocated_slots: usize,
    /// Wall time of both passes.
    pub elapsed: Duration,
}

impl AggregationSummary {
    /// Input throughput over both passes, in MiB per second.
    #[must_use]
    pub fn mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let bytes = (self.sizing.bytes + self.counting.bytes) as f64;
            bytes / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }
}

/// Drives the sizing and counting passes and owns the aggregated state.
#[derive(Debug)]
pub struct AggregationPipeline {
    interner: EndpointInterner,
    users: UserTable,
    sizing: Option<PassStats>,
}

impl AggregationPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            interner: EndpointInterner::new(),
            users: UserTable::from_config(config),
            sizing: None,
        }
    }

    /// Runs both passes over `source`.
    ///
    /// # Errors
    ///
    /// Any malformed line, I/O failure, counter overflow or disagreement
    /// between the two passes aborts the run.
    pub fn run<S: LogSource + ?Sized>(
        &mut self,
        source: &S,
        progress: &dyn ProgressObserver,
    ) -> Result<AggregationSummary> {
        let start = Instant::now();
        let total_bytes = source.total_bytes();
        info!(
            "Aggregating {} ({:.1} MB)",
            source.describe(),
            total_bytes as f64 / (1024.0 * 1024.0)
        );

        progress.pass_started(Pass::Sizing, total_bytes);
        let sizing = self.sizing_pass(&mut source.open()?, progress)?;
        progress.pass_finished(Pass::Sizing, &sizing);

        progress.pass_started(Pass::Counting, total_bytes);
        let counting = self.counting_pass(&mut source.open()?, progress)?;
        progress.pass_finished(Pass::Counting, &counting);

        let summary = AggregationSummary {
            sizing,
            counting,
            users: self.users.len(),
            endpoints: self.interner.len(),
            allocated_slots: self.users.allocated_slots(),
            elapsed: start.elapsed(),
        };

        info!(
            "Aggregation complete: {} lines, {} users, {} endpoints in {:.2}s ({:.1} MiB/s)",
            summary.counting.lines,
            summary.users,
            summary.endpoints,
            summary.elapsed.as_secs_f64(),
            summary.mib_per_sec()
        );

        Ok(summary)
    }

    /// First pass: registers every user and endpoint, then sizes all counter
    /// storage to the final endpoint count.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed lines or read failures.
    pub fn sizing_pass<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        progress: &dyn ProgressObserver,
    ) -> Result<PassStats> {
        let start = Instant::now();
        let users = &mut self.users;
        let interner = &mut self.interner;

        let stats = for_each_line(reader, progress, |line, line_no| {
            let record = LogRecord::parse(line, line_no)?;
            users.get_or_create(record.uid);
            interner.intern_or_lookup(record.endpoint);
            Ok(())
        })?;

        self.users.resize_all(self.interner.len());
        self.sizing = Some(stats);

        info!(
            "Sizing pass: {} lines, {} users, {} endpoints in {:.2}s",
            stats.lines,
            self.users.len(),
            self.interner.len(),
            start.elapsed().as_secs_f64()
        );
        debug!(
            "Counter slots allocated after sizing: {}",
            self.users.allocated_slots()
        );

        Ok(stats)
    }

    /// Second pass: updates the counter slot of every line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PassInconsistency`] if a user, an endpoint or the line
    /// count differs from the sizing pass, and [`Error::CounterOverflow`] if a
    /// counter would exceed `u32::MAX`.
    pub fn counting_pass<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        progress: &dyn ProgressObserver,
    ) -> Result<PassStats> {
        let start = Instant::now();
        let users = &mut self.users;
        let interner = &self.interner;

        let stats = for_each_line(reader, progress, |line, line_no| {
            let record = LogRecord::parse(line, line_no)?;
            let id = interner.get_id(record.endpoint).ok_or_else(|| {
                Error::PassInconsistency(format!(
                    "line {line_no}: endpoint '{}' was not seen during the sizing pass",
                    record.endpoint
                ))
            })?;
            let user = users.get_mut(record.uid).ok_or_else(|| {
                Error::PassInconsistency(format!(
                    "line {line_no}: user '{}' was not seen during the sizing pass",
                    record.uid
                ))
            })?;
            if !user.counters_mut().slot_mut(id).record(record.is_error()) {
                return Err(Error::CounterOverflow {
                    uid: record.uid.to_string(),
                    endpoint: record.endpoint.to_string(),
                });
            }
            Ok(())
        })?;

        if let Some(sizing) = self.sizing {
            if sizing.lines != stats.lines {
                return Err(Error::PassInconsistency(format!(
                    "sizing pass read {} lines, counting pass read {}",
                    sizing.lines, stats.lines
                )));
            }
        }

        info!(
            "Counting pass: {} lines in {:.2}s",
            stats.lines,
            start.elapsed().as_secs_f64()
        );

        Ok(stats)
    }

    /// Endpoint interner populated by the sizing pass.
    #[must_use]
    pub fn interner(&self) -> &EndpointInterner {
        &self.interner
    }

    /// User table populated by the sizing pass and updated by the counting pass.
    #[must_use]
    pub fn users(&self) -> &UserTable {
        &self.users
    }

    /// Consumes the pipeline, returning its aggregated state.
    #[must_use]
    pub fn into_parts(self) -> (UserTable, EndpointInterner) {
        (self.users, self.interner)
    }
}

/// Feeds every line of `reader` to `f` with its 1-based line number.
fn for_each_line<R, F>(
    reader: &mut R,
    progress: &dyn ProgressObserver,
    mut f: F,
) -> Result<PassStats>
where
    R: BufRead + ?Sized,
    F: FnMut(&str, u64) -> Result<()>,
{
    let mut stats = PassStats::default();
    let mut pending = 0u64;
    // Reuse one buffer for the whole pass
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        stats.lines += 1;
        stats.bytes += read as u64;

        let line = std::str::from_utf8(&buf).map_err(|_| Error::InvalidEncoding(stats.lines))?;
        f(line, stats.lines)?;

        pending += read as u64;
        if pending >= PROGRESS_STRIDE {
            progress.advanced(pending);
            pending = 0;
        }
    }

    if pending > 0 {
        progress.advanced(pending);
    }
    Ok(stats)
}
