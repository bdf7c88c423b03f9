//! # `logratio` Core
//!
//! Streaming error-ratio aggregation for very large access logs.
//!
//! For every (user, endpoint) pair in the log, computes
//! `errors / (entries - errors)`, where an error is any line whose status code
//! does not start with `2`. Memory grows with the number of distinct users and
//! endpoints, never with the size of the file.
//!
//! ## How it works
//!
//! - **Sizing pass**: reads the whole log once to register users and intern endpoints.
//! - **Counting pass**: reads it again and bumps per-(user, endpoint) counters.
//! - **Report**: streams `UID<TAB>endpoint<TAB>error_ratio` rows in batches.
//!
//! ## Quick Start
//!
//! ```rust
//! use logratio_core::{AggregationPipeline, AggregatorConfig, MemorySource, NoProgress, ReportWriter};
//!
//! let log = "10.0.0.1 hGsd8sdk /admin 200 12\n10.0.0.2 hGsd8sdk /admin 500 40\n";
//! let config = AggregatorConfig::default();
//!
//! let mut pipeline = AggregationPipeline::new(&config.pipeline);
//! pipeline.run(&MemorySource::new(log), &NoProgress)?;
//!
//! let mut writer = ReportWriter::new(Vec::new(), &config.report);
//! writer.write_report(pipeline.users(), pipeline.interner())?;
//! let report = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(report, "UID\tendpoint\terror_ratio\nhGsd8sdk\t/admin\t1\n");
//! # Ok::<(), logratio_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // Byte counts shown as MB in logs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod counters;
#[cfg(test)]
mod counters_tests;
pub mod error;
pub mod interner;
pub mod line;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod source;
pub mod users;

pub use config::{
    AggregatorConfig, ConfigError, LoggingConfig, PipelineConfig, ReportConfig, RowSelection,
    StorageMode, MAX_BATCH_SIZE, MAX_INITIAL_SLOTS, MAX_READ_BUFFER_BYTES, MIN_READ_BUFFER_BYTES,
};
pub use counters::{CompactCounterArray, CounterSlot, CounterStore, SparseCounters};
pub use error::{Error, Result};
pub use interner::{EndpointId, EndpointInterner, UNKNOWN_ENDPOINT};
pub use line::{LogRecord, REQUIRED_FIELDS};
pub use pipeline::{AggregationPipeline, AggregationSummary};
pub use progress::{NoProgress, Pass, PassStats, ProgressObserver};
pub use report::{ErrorRatio, ReportStats, ReportWriter, REPORT_HEADER};
pub use source::{FileSource, LogSource, MemorySource};
pub use users::{UserRecord, UserTable};
