//! Configuration for the Key Management Subsystem

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Default key lifetime before rotation is due (90 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(90 * 24 * 3600);

/// Default verification window for a superseded key (7 days).
pub const DEFAULT_OVERLAP: Duration = Duration::from_secs(7 * 24 * 3600);

/// Upper bound for either policy duration (100 years).
pub const MAX_POLICY_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Key rotation policy.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRotationPolicy {
    /// Lifetime of an active key before it is due for rotation
    #[serde_as(as = "DurationSeconds<u64>")]
    pub max_age: Duration,
    /// How long a superseded key keeps verifying
    #[serde_as(as = "DurationSeconds<u64>")]
    pub overlap: Duration,
}

impl Default for KeyRotationPolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl KeyRotationPolicy {
    pub fn new(max_age: Duration, overlap: Duration) -> Self {
        Self { max_age, overlap }
    }

    /// Create policy from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VT_KEY_MAX_AGE_SECS`: Key lifetime in seconds (default: 7776000)
    /// - `VT_KEY_OVERLAP_SECS`: Overlap window in seconds (default: 604800)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    /// Unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let seconds = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| match v.trim().parse::<u64>() {
                    Ok(secs) => Some(Duration::from_secs(secs)),
                    Err(_) => {
                        warn!(variable = key, value = %v, "[vt-02] ignoring unparsable duration");
                        None
                    }
                })
                .unwrap_or(default)
        };

        Self {
            max_age: seconds("VT_KEY_MAX_AGE_SECS", DEFAULT_MAX_AGE),
            overlap: seconds("VT_KEY_OVERLAP_SECS", DEFAULT_OVERLAP),
        }
    }

    /// Reject a zero lifetime and durations beyond [`MAX_POLICY_DURATION`].
    pub fn validate(&self) -> Result<(), String> {
        if self.max_age.is_zero() {
            return Err("max_age must be greater than zero".to_string());
        }
        if self.max_age > MAX_POLICY_DURATION || self.overlap > MAX_POLICY_DURATION {
            return Err(format!(
                "durations must not exceed {} seconds",
                MAX_POLICY_DURATION.as_secs()
            ));
        }
        Ok(())
    }

    /// `max_age` as a calendar duration, clamped to [`MAX_POLICY_DURATION`].
    pub fn max_age_delta(&self) -> chrono::Duration {
        to_delta(self.max_age)
    }

    /// `overlap` as a calendar duration, clamped to [`MAX_POLICY_DURATION`].
    pub fn overlap_delta(&self) -> chrono::Duration {
        to_delta(self.overlap)
    }
}

fn to_delta(duration: Duration) -> chrono::Duration {
    let secs = duration.min(MAX_POLICY_DURATION).as_secs();
    chrono::Duration::seconds(secs as i64)
}
