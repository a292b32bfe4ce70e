//! Progress reporting.
//!
//! The executor reports at batch granularity (`start`, `advance`) plus a
//! free-text status line for the current operation. Rendering is up to the sink.

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::executor::ExitOutcome;
use super::record::MigrationBatch;

pub trait ProgressSink {
    fn start(&mut self, _total_groups: u64) {}
    fn batch_started(&mut self, _batch: &MigrationBatch) {}
    fn status(&mut self, _message: &str) {}
    fn memory(&mut self, _bytes: Option<u64>) {}
    /// One batch finished (moved and reclaimed).
    fn advance(&mut self) {}
    fn finish(&mut self, _outcome: ExitOutcome) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}

const BAR_TEMPLATE: &str =
    "{pos:>7}/{len:7} groups [{elapsed_precise} / eta {eta_precise}] {prefix:.dim} {wide_msg}";

/// Terminal progress bar: groups done/total, elapsed and ETA, memory, status line.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template(BAR_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn start(&mut self, total_groups: u64) {
        self.bar.set_length(total_groups);
        self.bar.set_position(0);
        self.bar.reset_eta();
    }

    fn status(&mut self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn memory(&mut self, bytes: Option<u64>) {
        match bytes {
            Some(b) => self.bar.set_prefix(format!("mem {}", HumanBytes(b))),
            None => self.bar.set_prefix("mem n/a"),
        }
    }

    fn advance(&mut self) {
        self.bar.inc(1);
    }

    fn finish(&mut self, outcome: ExitOutcome) {
        match outcome {
            ExitOutcome::Completed => self.bar.finish_with_message("done"),
            ExitOutcome::CancelledCleanly => self.bar.abandon_with_message("interrupted"),
            ExitOutcome::AbortedOnResource => self.bar.abandon_with_message("stopped: memory headroom"),
        }
    }
}
