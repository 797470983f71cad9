//! Progress reporting seam between the coordinator and a UI.
//!
//! The library never renders anything itself; the binary plugs in an
//! `indicatif` bar, tests plug in a recorder or [`NoProgress`].

/// Receives progress notifications from a download run.
///
/// Called from concurrently running tasks, so implementations must be
/// `Send + Sync`. All methods default to no-ops.
pub trait ProgressObserver: Send + Sync {
    /// The page was parsed and `total` elements matched.
    fn started(&self, total: usize) {
        let _ = total;
    }

    /// One more element finished; `done` of `total` are complete.
    ///
    /// `name` is the saved filename, or `None` for a skipped or failed element.
    fn advanced(&self, done: usize, total: usize, name: Option<&str>) {
        let _ = (done, total, name);
    }

    /// All elements finished.
    fn finished(&self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
