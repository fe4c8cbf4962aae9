//! Progress bar for sync runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{ProgressCallback, SyncOutcome};

/// Drives an indicatif bar from engine progress events
pub struct SyncProgress {
    bar: ProgressBar,
}

impl SyncProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for SyncProgress {
    fn on_batch_start(&self, index: usize, size: usize) {
        self.bar
            .set_message(format!("batch {} ({size} drafts)", index + 1));
    }

    fn on_resource_complete(&self, key: &str, outcome: &SyncOutcome) {
        if let SyncOutcome::Failed(error) = outcome {
            self.bar.suspend(|| {
                println!("  {} {}", "✗".red(), error);
            });
        } else {
            log::trace!("{key}: {outcome:?}");
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, index: usize) {
        log::debug!("batch {} complete", index + 1);
    }
}
