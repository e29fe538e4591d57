//! # Key Lifecycle Rules
//!
//! Pure functions deciding timestamps and status transitions. No I/O.
//!
//! | From | Allowed targets |
//! |------|-----------------|
//! | active | rotating, expired, revoked |
//! | rotating | expired, revoked |
//! | expired | revoked |
//! | revoked | (terminal) |

use crate::config::KeyRotationPolicy;
use crate::domain::entities::{KeyRecord, KeyStatus};
use chrono::{DateTime, Duration, Utc};

/// What a sweep should do with one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleAction {
    Keep,
    /// Still active but past `rotate_at`
    DueForRotation,
    /// Past `expires_at`
    Expire,
}

/// `instant + delta`, saturating at the maximum representable time.
pub fn saturating_add(instant: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    instant
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// When a key created at `created_at` becomes due for rotation.
pub fn rotate_at(created_at: DateTime<Utc>, policy: &KeyRotationPolicy) -> DateTime<Utc> {
    saturating_add(created_at, policy.max_age_delta())
}

/// Hard end of life: `created_at + max_age + overlap`.
pub fn hard_expiry(created_at: DateTime<Utc>, policy: &KeyRotationPolicy) -> DateTime<Utc> {
    saturating_add(rotate_at(created_at, policy), policy.overlap_delta())
}

/// End of the verification window for a key superseded at `now`.
pub fn rotation_expiry(
    record: &KeyRecord,
    now: DateTime<Utc>,
    policy: &KeyRotationPolicy,
) -> DateTime<Utc> {
    saturating_add(now, policy.overlap_delta()).min(hard_expiry(record.created_at, policy))
}

pub fn can_transition(from: KeyStatus, to: KeyStatus) -> bool {
    use KeyStatus::*;
    matches!(
        (from, to),
        (Active, Rotating)
            | (Active, Expired)
            | (Active, Revoked)
            | (Rotating, Expired)
            | (Rotating, Revoked)
            | (Expired, Revoked)
    )
}

/// Sweep decision for one record at `now`.
pub fn evaluate(record: &KeyRecord, now: DateTime<Utc>) -> LifecycleAction {
    if !matches!(record.status, KeyStatus::Active | KeyStatus::Rotating) {
        return LifecycleAction::Keep;
    }
    if record.expires_at.is_some_and(|t| now >= t) {
        return LifecycleAction::Expire;
    }
    if record.status == KeyStatus::Active && record.rotate_at.is_some_and(|t| now >= t) {
        return LifecycleAction::DueForRotation;
    }
    LifecycleAction::Keep
}

/// Whether an active record may still sign at `now` (not yet swept but past expiry).
pub fn is_signing_eligible(record: &KeyRecord, now: DateTime<Utc>) -> bool {
    record.status.can_sign() && record.expires_at.map_or(true, |t| now < t)
}
