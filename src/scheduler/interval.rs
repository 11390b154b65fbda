//! Probe interval bounds.

use std::time::Duration;

/// Shortest allowed probe interval: 1 minute.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);
/// Longest allowed probe interval: 10 hours.
pub const MAX_INTERVAL: Duration = Duration::from_secs(10 * 60 * 60);

/// Clamp a requested interval into `[MIN_INTERVAL, MAX_INTERVAL]`.
///
/// Out-of-range values are coerced, never rejected.
pub fn validate_interval(requested: Duration) -> Duration {
    requested.clamp(MIN_INTERVAL, MAX_INTERVAL)
}
