// src/commands/progress.rs
//! Terminal progress for conversions
//!
//! One bar reused across phases: each phase resets its length and message.

use indicatif::{ProgressBar, ProgressStyle};
use olx_convert::ProgressTracker;
use std::time::Duration;

pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {msg} ({pos}/{len}) [{bar:40.green/dim}]")
                .expect("Invalid progress bar template")
                .progress_chars("##-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressTracker for CliProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn set_length(&self, length: u64) {
        self.bar.set_length(length);
        self.bar.set_position(0);
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn finish_with_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("failed: {}", message));
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
