//! # Key Management Entities
//!
//! Records owned by the key manager and the read-only views handed out to
//! other components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vt_crypto::{Curve, PrivateKey};

/// Free-form labels attached to a key (owner, purpose, ticket...).
pub type KeyMetadata = BTreeMap<String, String>;

/// Lifecycle status of a stored key.
///
/// ```text
/// active ──rotate──▶ rotating ──sweep──▶ expired
///    │                  │                   │
///    └──────────────────┴──── revoke ───────┴──▶ revoked
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// Signs new tokens and verifies issued ones
    Active,
    /// Superseded; verifies only, until its overlap window closes
    Rotating,
    /// Past its lifetime; kept for verification lookups
    Expired,
    /// Withdrawn after a security incident; never used again
    Revoked,
}

impl KeyStatus {
    pub const ALL: [KeyStatus; 4] = [
        KeyStatus::Active,
        KeyStatus::Rotating,
        KeyStatus::Expired,
        KeyStatus::Revoked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "active",
            KeyStatus::Rotating => "rotating",
            KeyStatus::Expired => "expired",
            KeyStatus::Revoked => "revoked",
        }
    }

    /// Whether a key in this status may sign new tokens.
    pub fn can_sign(&self) -> bool {
        matches!(self, KeyStatus::Active)
    }

    /// Whether tokens signed by a key in this status may still be checked.
    pub fn can_verify(&self) -> bool {
        !matches!(self, KeyStatus::Revoked)
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored key with its lifecycle timestamps.
///
/// Only the key manager mutates `status` and the timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key_id: String,
    pub curve: Curve,
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    pub private_key: PrivateKey,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    /// Instant after which the sweep moves the key to `expired`
    pub expires_at: Option<DateTime<Utc>>,
    /// Instant after which the key is reported as due for rotation
    pub rotate_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: KeyMetadata,
}

impl KeyRecord {
    /// Age at `now`; zero for records stamped in the future.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }

    /// View without private material.
    pub fn summary(&self) -> KeySummary {
        KeySummary {
            key_id: self.key_id.clone(),
            curve: self.curve,
            public_key: self.public_key.clone(),
            status: self.status,
            created_at: self.created_at,
            activated_at: self.activated_at,
            expires_at: self.expires_at,
            rotate_at: self.rotate_at,
            metadata: self.metadata.clone(),
        }
    }

    pub fn public_key_info(&self) -> PublicKeyInfo {
        PublicKeyInfo {
            key_id: self.key_id.clone(),
            curve: self.curve,
            public_key: self.public_key.clone(),
            status: self.status,
        }
    }
}

/// [`KeyRecord`] without the private scalar. Safe to log and list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySummary {
    pub key_id: String,
    pub curve: Curve,
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub rotate_at: Option<DateTime<Utc>>,
    pub metadata: KeyMetadata,
}

/// Public half of a stored key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    pub key_id: String,
    pub curve: Curve,
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    pub status: KeyStatus,
}

/// Filter for listing keys. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyFilter {
    pub curve: Option<Curve>,
    pub status: Option<KeyStatus>,
    /// Inclusive lower bound on `created_at`
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
}

impl KeyFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_status(mut self, status: KeyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_between(mut self, after: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.created_after = Some(after);
        self.created_before = Some(before);
        self
    }

    pub fn matches(&self, record: &KeyRecord) -> bool {
        self.curve.map_or(true, |c| c == record.curve)
            && self.status.map_or(true, |s| s == record.status)
            && self.created_after.map_or(true, |t| record.created_at >= t)
            && self.created_before.map_or(true, |t| record.created_at < t)
    }
}

/// Outcome of one lifecycle sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Keys moved to `expired` by this sweep
    pub expired: Vec<String>,
    /// Active keys past `rotate_at`; the owner should rotate them
    pub due_for_rotation: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.due_for_rotation.is_empty()
    }
}

/// Key counts per status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatistics {
    pub total: usize,
    pub active: usize,
    pub rotating: usize,
    pub expired: usize,
    pub revoked: usize,
}

impl KeyStatistics {
    pub fn from_statuses(statuses: impl IntoIterator<Item = KeyStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                KeyStatus::Active => stats.active += 1,
                KeyStatus::Rotating => stats.rotating += 1,
                KeyStatus::Expired => stats.expired += 1,
                KeyStatus::Revoked => stats.revoked += 1,
            }
        }
        stats
    }
}
