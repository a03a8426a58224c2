//! Baseline retry tuning.

use std::time::Duration;

/// Default retry tuning, carried by an injected configuration value.
///
/// These are the numbers a retry policy starts from when the caller does
/// not supply its own: 3 total attempts, 500ms initial backoff doubling to
/// an 8 second ceiling, and each delay down-jittered by up to 25%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryDefaults {
    /// Total attempt budget, counting the first try.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = each delay shrunk by up to 25%).
    pub jitter_factor: f64,
}

impl Default for RetryDefaults {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}
