//! Progress reporting hooks for the two passes.

use std::fmt;

/// The two sequential scans of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Discovers users and endpoints.
    Sizing,
    /// Updates counters.
    Counting,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sizing => f.write_str("sizing"),
            Self::Counting => f.write_str("counting"),
        }
    }
}

/// Lines and bytes consumed by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Lines read.
    pub lines: u64,
    /// Bytes read, line terminators included.
    pub bytes: u64,
}

/// Receives progress callbacks from the pipeline.
pub trait ProgressObserver {
    /// A pass is about to read `total_bytes` bytes.
    fn pass_started(&self, pass: Pass, total_bytes: u64);

    /// `bytes` more bytes were consumed.
    fn advanced(&self, bytes: u64);

    /// A pass reached end of input.
    fn pass_finished(&self, pass: Pass, stats: &PassStats);
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn pass_started(&self, _pass: Pass, _total_bytes: u64) {}

    fn advanced(&self, _bytes: u64) {}

    fn pass_finished(&self, _pass: Pass, _stats: &PassStats) {}
}
