//! Time source abstraction.
//!
//! Token expiry and key lifecycle decisions read time through [`Clock`] so
//! tests can simulate waiting without sleeping.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;

/// Abstract interface for time operations (for testability).
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current time in whole seconds since the Unix epoch.
    fn unix_now(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    current: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Start at the given Unix timestamp (seconds). Out-of-range values fall back to the epoch.
    pub fn at_unix(secs: i64) -> Self {
        let start = Utc
            .timestamp_opt(secs, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::new(start)
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.write() = instant;
    }

    /// Move forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.write();
        *current += by;
    }

    /// Move forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}
