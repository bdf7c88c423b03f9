//! Console progress bar for the two passes.

use indicatif::{ProgressBar, ProgressStyle};
use logratio_core::{Pass, PassStats, ProgressObserver};
use tracing::debug;

/// Byte-based progress bar, reset at the start of each pass.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a visible bar, or a hidden one when `show` is false.
    pub fn new(show: bool) -> Self {
        let bar = if show {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} {msg:>9} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Clears the bar once both passes are done.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarProgress {
    fn pass_started(&self, pass: Pass, total_bytes: u64) {
        self.bar.reset();
        self.bar.set_length(total_bytes);
        self.bar.set_message(pass.to_string());
    }

    fn advanced(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn pass_finished(&self, pass: Pass, stats: &PassStats) {
        self.bar.set_position(stats.bytes);
        debug!("{} pass read {} lines", pass, stats.lines);
    }
}
