//! Progress bar implementation for CLI operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use assetshift::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for a relocation job
pub struct CliProgress {
    bar: ProgressBar,
    cancel: Arc<AtomicBool>,
}

impl CliProgress {
    /// Creates a new progress display reporting percentages
    pub fn new(quiet: bool, cancel: Arc<AtomicBool>) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        };

        Self { bar, cancel }
    }

    /// Finishes the progress display and clears it
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Finishes with a custom message, keeping the bar visible
    pub fn abandon(&self, msg: impl Into<String>) {
        self.bar.abandon_with_message(msg.into());
    }
}

impl ProgressSink for CliProgress {
    fn on_progress(&mut self, percent: u8, label: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(label.to_string());
    }

    fn on_entry(&mut self, name: &str) {
        // Truncate long names
        let len = name.chars().count();
        let display_name = if len > 40 {
            let tail: String = name.chars().skip(len - 37).collect();
            format!("...{}", tail)
        } else {
            name.to_string()
        };
        self.bar.set_message(display_name);
    }

    fn should_cancel(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}
