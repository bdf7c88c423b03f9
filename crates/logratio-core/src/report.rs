//! Report emission.
//!
//! Output is tab-separated text:
//!
//! ```text
//! UID	endpoint	error_ratio
//! hGsd8sdk	/admin	0
//! hGsd8sdk	/user/contacts	inf
//! ```
//!
//! Users come out in first-seen order, endpoints in id order within each user.
//! Rows are buffered and written `batch_size` at a time.

use std::fmt::{self, Write as _};
use std::io::Write;

use tracing::debug;

use crate::config::{ReportConfig, RowSelection};
use crate::counters::CounterSlot;
use crate::error::Result;
use crate::interner::EndpointInterner;
use crate::users::UserTable;

/// Typical row width, used to size the batch buffer.
const ROW_BYTES_HINT: usize = 48;
/// Upper bound on the batch buffer reserved up front.
const MAX_BUFFER_PREALLOC: usize = 4 << 20;

/// First line of every report.
pub const REPORT_HEADER: &str = "UID\tendpoint\terror_ratio";

/// `errors / successful` for one (user, endpoint) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorRatio {
    /// At least one successful request.
    Finite(f64),
    /// No successful request, including pairs with no requests at all.
    Infinite,
}

impl ErrorRatio {
    /// Computes the ratio for a counter slot.
    #[must_use]
    pub fn from_slot(slot: CounterSlot) -> Self {
        match slot.successful() {
            0 => Self::Infinite,
            successful => Self::Finite(f64::from(slot.errors()) / f64::from(successful)),
        }
    }
}

impl fmt::Display for ErrorRatio {
    /// Honors `{:.N}` for finite values; `inf` is never padded with decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.precision()) {
            (Self::Infinite, _) => f.write_str("inf"),
            (Self::Finite(value), Some(precision)) => write!(f, "{value:.precision$}"),
            (Self::Finite(value), None) => write!(f, "{value}"),
        }
    }
}

/// Statistics from writing one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Data rows written, header excluded.
    pub rows: u64,
    /// `write_all` calls issued to the sink.
    pub batches: u64,
    /// Rows whose ratio was `inf`.
    pub infinite_rows: u64,
}

/// Streams report rows into a sink in fixed-size batches.
pub struct ReportWriter<W: Write> {
    sink: W,
    batch_size: usize,
    rows: RowSelection,
    precision: Option<usize>,
    buffer: String,
    buffered_rows: usize,
    stats: ReportStats,
}

impl<W: Write> ReportWriter<W> {
    /// Creates a writer using the report settings.
    #[must_use]
    pub fn new(sink: W, config: &ReportConfig) -> Self {
        let batch_size = config.batch_size.max(1);
        Self {
            sink,
            batch_size,
            rows: config.rows,
            precision: config.ratio_precision,
            buffer: String::with_capacity(
                batch_size
                    .saturating_mul(ROW_BYTES_HINT)
                    .min(MAX_BUFFER_PREALLOC),
            ),
            buffered_rows: 0,
            stats: ReportStats::default(),
        }
    }

    /// Writes the header and every row, then flushes the sink.
    ///
    /// Each call emits one complete report and returns the statistics of that
    /// report only; rows left unflushed by an earlier failed call are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn write_report(
        &mut self,
        users: &UserTable,
        interner: &EndpointInterner,
    ) -> Result<ReportStats> {
        self.buffer.clear();
        self.buffered_rows = 0;
        self.stats = ReportStats::default();

        self.buffer.push_str(REPORT_HEADER);
        self.buffer.push('\n');

        for (uid, record) in users.iter() {
            let counters = record.counters();
            match self.rows {
                RowSelection::CrossProduct => {
                    for (id, endpoint) in interner.iter() {
                        self.push_row(uid, endpoint, counters.get(id))?;
                    }
                }
                RowSelection::Observed => {
                    for (id, slot) in counters.observed() {
                        self.push_row(uid, interner.lookup(id), slot)?;
                    }
                }
            }
        }

        self.flush_batch()?;
        self.sink.flush()?;

        debug!(
            "Report written: {} rows in {} batches ({} inf)",
            self.stats.rows, self.stats.batches, self.stats.infinite_rows
        );
        Ok(self.stats)
    }

    /// Statistics accumulated so far.
    #[must_use]
    pub fn stats(&self) -> ReportStats {
        self.stats
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn push_row(&mut self, uid: &str, endpoint: &str, slot: CounterSlot) -> Result<()> {
        let ratio = ErrorRatio::from_slot(slot);
        if ratio == ErrorRatio::Infinite {
            self.stats.infinite_rows += 1;
        }

        // Writing into a String cannot fail
        let _ = match self.precision {
            Some(precision) => writeln!(self.buffer, "{uid}\t{endpoint}\t{ratio:.precision$}"),
            None => writeln!(self.buffer, "{uid}\t{endpoint}\t{ratio}"),
        };
        self.stats.rows += 1;
        self.buffered_rows += 1;

        if self.buffered_rows >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sink.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        self.buffered_rows = 0;
        self.stats.batches += 1;
        Ok(())
    }
}
