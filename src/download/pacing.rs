//! Courtesy gap between image requests.
//!
//! Text-generation endpoints reject bursts ("requests too frequent"), so each
//! unit of work waits a growing delay once it holds a concurrency slot: the
//! n-th caller waits `n * step` (0, step, 2*step, ...). The gap staggers the
//! first wave of workers; later workers already had to wait for a slot.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use picture_downloader_core::download::Pacer;
//!
//! let pacer = Pacer::new(Duration::from_millis(300));
//! assert_eq!(pacer.next_delay(), Duration::ZERO);
//! assert_eq!(pacer.next_delay(), Duration::from_millis(300));
//! assert_eq!(pacer.next_delay(), Duration::from_millis(600));
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::constants::PACING_WARNING_THRESHOLD;

/// Incrementing inter-request delay, shared by all workers of a run.
#[derive(Debug)]
pub struct Pacer {
    step: Duration,
    issued: AtomicU32,
}

impl Pacer {
    /// Creates a pacer whose n-th delay is `n * step`.
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            issued: AtomicU32::new(0),
        }
    }

    /// Creates a pacer that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.step.is_zero()
    }

    /// Returns the configured step.
    #[must_use]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Claims the next delay in the sequence.
    pub fn next_delay(&self) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        self.step.saturating_mul(n)
    }

    /// Sleeps for the next delay in the sequence.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        if delay >= PACING_WARNING_THRESHOLD {
            warn!(
                delay_secs = delay.as_secs(),
                "long pacing delay - consider a smaller --pace-ms or disabling naming"
            );
        } else {
            debug!(delay_ms = delay.as_millis(), "pacing before request");
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_increments_by_step() {
        let pacer = Pacer::new(Duration::from_millis(100));
        let delays: Vec<_> = (0..4).map(|_| pacer.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
            ]
        );
    }

    #[test]
    fn test_pacer_disabled_never_waits() {
        let pacer = Pacer::disabled();
        assert!(pacer.is_disabled());
        for _ in 0..10 {
            assert_eq!(pacer.next_delay(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_wait_sleeps_for_delay() {
        let pacer = Pacer::new(Duration::from_secs(1));
        pacer.wait().await;

        let start = tokio::time::Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_pacer_shared_across_threads() {
        use std::sync::Arc;

        let pacer = Arc::new(Pacer::new(Duration::from_millis(1)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pacer = Arc::clone(&pacer);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        pacer.next_delay();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pacer.next_delay(), Duration::from_millis(80));
    }
}
