//! # Security Audit Events
//!
//! The trust subsystems emit [`SecurityAuditEvent`]s; they never persist them.
//! Delivery goes through the injected [`AuditLogger`]. When none is configured
//! the [`NoopAuditLogger`] drops events (no buffering, no retry).
//!
//! ## Sanitization
//!
//! Token events carry [`SanitizedClaims`] only: `vid`, `typ`, `iss`, `aud`,
//! `exp`, `iat`, `jti` and `lmt`. User ids and batch codes never reach a sink.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// EVENT MODEL
// =============================================================================

/// Kind of security-relevant operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    KeyGenerated,
    KeyStored,
    KeyRotation,
    KeyExpired,
    KeyRevoked,
    KeyDeleted,
    TokenGenerated,
    TokenVerified,
    TokenRejected,
    SecurityViolation,
}

impl AuditEventType {
    /// Wire name, e.g. `"key_rotation"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::KeyGenerated => "key_generated",
            AuditEventType::KeyStored => "key_stored",
            AuditEventType::KeyRotation => "key_rotation",
            AuditEventType::KeyExpired => "key_expired",
            AuditEventType::KeyRevoked => "key_revoked",
            AuditEventType::KeyDeleted => "key_deleted",
            AuditEventType::TokenGenerated => "token_generated",
            AuditEventType::TokenVerified => "token_verified",
            AuditEventType::TokenRejected => "token_rejected",
            AuditEventType::SecurityViolation => "security_violation",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Non-identifying subset of redemption-token claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedClaims {
    pub vid: String,
    pub typ: String,
    pub iss: String,
    pub aud: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    pub iat: i64,
    pub jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lmt: Option<u32>,
}

/// Details of a key lifecycle operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOperationDetails {
    /// Operation name (`store`, `rotate`, `revoke`, ...)
    pub operation: String,
    /// Curve name, e.g. `P-256`
    pub curve: Option<String>,
    /// Status before the operation
    pub previous_status: Option<String>,
    /// Status after the operation
    pub new_status: Option<String>,
    /// Successor key for rotations
    pub successor_key_id: Option<String>,
    /// Free-form reason (revocation cause, sweep)
    pub reason: Option<String>,
}

impl KeyOperationDetails {
    /// Details with only the operation name set.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            curve: None,
            previous_status: None,
            new_status: None,
            successor_key_id: None,
            reason: None,
        }
    }
}

/// Details of a token issue/verify operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOperationDetails {
    /// Operation name (`generate`, `verify`)
    pub operation: String,
    /// Signing algorithm identifier
    pub algorithm: String,
    /// Claims with identifying fields stripped
    pub claims: Option<SanitizedClaims>,
    /// Whether the operation succeeded
    pub success: bool,
    /// Stable error identifier on failure
    pub error_code: Option<String>,
}

/// Category of an attempted or suspected attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    AlgorithmConfusion,
    SignatureTampering,
    CurveMismatch,
    MalformedToken,
    RevokedKeyUse,
}

/// Details of a security violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityViolationDetails {
    pub violation: ViolationKind,
    pub description: String,
}

/// Event payload, one variant per operation family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditDetails {
    Key(KeyOperationDetails),
    Token(TokenOperationDetails),
    Violation(SecurityViolationDetails),
}

/// A write-once security audit record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub details: AuditDetails,
    pub severity: AuditSeverity,
}

impl SecurityAuditEvent {
    /// Key lifecycle event.
    pub fn key(
        timestamp: DateTime<Utc>,
        event_type: AuditEventType,
        key_id: impl Into<String>,
        details: KeyOperationDetails,
        severity: AuditSeverity,
    ) -> Self {
        Self {
            timestamp,
            event_type,
            key_id: Some(key_id.into()),
            user_id: None,
            details: AuditDetails::Key(details),
            severity,
        }
    }

    /// Token operation event.
    pub fn token(
        timestamp: DateTime<Utc>,
        event_type: AuditEventType,
        key_id: Option<String>,
        details: TokenOperationDetails,
        severity: AuditSeverity,
    ) -> Self {
        Self {
            timestamp,
            event_type,
            key_id,
            user_id: None,
            details: AuditDetails::Token(details),
            severity,
        }
    }

    /// `security_violation` event, always at `Warning` or above.
    pub fn violation(
        timestamp: DateTime<Utc>,
        key_id: Option<String>,
        violation: ViolationKind,
        description: impl Into<String>,
    ) -> Self {
        let severity = match violation {
            ViolationKind::AlgorithmConfusion | ViolationKind::RevokedKeyUse => {
                AuditSeverity::Critical
            }
            ViolationKind::SignatureTampering | ViolationKind::CurveMismatch => {
                AuditSeverity::Error
            }
            ViolationKind::MalformedToken => AuditSeverity::Warning,
        };
        Self {
            timestamp,
            event_type: AuditEventType::SecurityViolation,
            key_id,
            user_id: None,
            details: AuditDetails::Violation(SecurityViolationDetails {
                violation,
                description: description.into(),
            }),
            severity,
        }
    }
}

// =============================================================================
// AUDIT SINK PORT
// =============================================================================

/// Receives audit events. Implementations must not block for long.
pub trait AuditLogger: Send + Sync {
    /// Deliver one event. Failures are the sink's concern.
    fn log(&self, event: SecurityAuditEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogger;

impl AuditLogger for NoopAuditLogger {
    fn log(&self, _event: SecurityAuditEvent) {}
}

/// Keeps events in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    events: Mutex<Vec<SecurityAuditEvent>>,
}

impl MemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn events(&self) -> Vec<SecurityAuditEvent> {
        self.events.lock().clone()
    }

    /// Events of one type.
    pub fn events_of(&self, event_type: AuditEventType) -> Vec<SecurityAuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, event: SecurityAuditEvent) {
        tracing::trace!(event_type = %event.event_type, "[vt-audit] event captured");
        self.events.lock().push(event);
    }
}
