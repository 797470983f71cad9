//! Explicit elapsed-time measurement for call sites.
//!
//! ```
//! use picture_downloader_core::timing::ScopedTimer;
//!
//! let timer = ScopedTimer::start("parse");
//! let total: u32 = (1..=10).sum();
//! let elapsed = timer.finish();
//! assert_eq!(total, 55);
//! assert!(elapsed.as_secs() < 1);
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

/// Measures one operation and logs its duration when finished.
#[derive(Debug)]
pub struct ScopedTimer {
    label: &'static str,
    started: Instant,
}

impl ScopedTimer {
    /// Starts timing `label`.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// Returns the time elapsed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the timer, logs the duration at debug level, and returns it.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            operation = self.label,
            elapsed_ms = elapsed.as_millis(),
            "operation finished"
        );
        elapsed
    }
}
