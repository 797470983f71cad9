//! Progress bar for download runs.

use indicatif::{ProgressBar, ProgressStyle};
use picture_downloader_core::ProgressObserver;

/// Renders pipeline progress as an `indicatif` bar on stderr.
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a visible bar, or a hidden one when `enabled` is false.
    pub(crate) fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }
}

impl ProgressObserver for BarProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("downloading");
    }

    fn advanced(&self, done: usize, _total: usize, name: Option<&str>) {
        self.bar.set_position(done as u64);
        if let Some(name) = name {
            self.bar.set_message(name.to_string());
        }
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}

pub(crate) fn should_show_bar(stderr_is_terminal: bool, quiet: bool) -> bool {
    stderr_is_terminal && !quiet
}
