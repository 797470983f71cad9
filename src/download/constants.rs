//! Constants for the download module (timeouts, pacing, limits).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP total timeout (5 minutes; naming streams can be slow).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default courtesy gap step between image requests.
pub const DEFAULT_PACE: Duration = Duration::from_millis(300);

/// Pacing delays at or above this are logged as warnings.
pub const PACING_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Attempts at finding a free name when exclusive creation loses a race.
pub const MAX_CREATE_ATTEMPTS: usize = 5;
