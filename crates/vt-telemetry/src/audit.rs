//! `tracing`-backed audit sink.
//!
//! Each [`SecurityAuditEvent`] becomes one record under target `vt_audit`
//! with the event serialized as JSON in the `event` field. Level follows
//! severity: info, warn, error, and error again for critical.

use tracing::{error, info, warn};
use vt_shared_types::{AuditLogger, AuditSeverity, SecurityAuditEvent};

/// Target used for every audit record, for `EnvFilter` routing.
pub const AUDIT_TARGET: &str = "vt_audit";

/// [`AuditLogger`] that writes to the global `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger {
    service_name: Option<String>,
}

impl TracingAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a service name to every record.
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
        }
    }
}

/// JSON rendering of an event; falls back to `Debug` if serialization fails.
pub fn render_event(event: &SecurityAuditEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| format!("{event:?}"))
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: SecurityAuditEvent) {
        let payload = render_event(&event);
        let service = self.service_name.as_deref().unwrap_or("-");
        let key_id = event.key_id.as_deref().unwrap_or("-");
        let event_type = event.event_type.as_str();

        match event.severity {
            AuditSeverity::Info => info!(
                target: "vt_audit",
                service,
                event_type,
                key_id,
                severity = "info",
                event = %payload,
                "security audit event"
            ),
            AuditSeverity::Warning => warn!(
                target: "vt_audit",
                service,
                event_type,
                key_id,
                severity = "warning",
                event = %payload,
                "security audit event"
            ),
            AuditSeverity::Error => error!(
                target: "vt_audit",
                service,
                event_type,
                key_id,
                severity = "error",
                event = %payload,
                "security audit event"
            ),
            AuditSeverity::Critical => error!(
                target: "vt_audit",
                service,
                event_type,
                key_id,
                severity = "critical",
                event = %payload,
                "security audit event"
            ),
        }
    }
}
