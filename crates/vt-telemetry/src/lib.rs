//! # VT Telemetry
//!
//! Structured logging for the voucher trust subsystems.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   JSON or human-readable fmt layer
//! - **Audit**: [`TracingAuditLogger`], an `AuditLogger` that writes each
//!   security event as one structured record under target `vt_audit`
//! - **Macros**: [`log_event!`], [`log_key_event!`] and [`log_token_event!`]
//!   for consistent fields across the subsystems
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vt_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::for_subsystem("02", "key-management");
//! let _handle = init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VT_SERVICE_NAME` | `voucher-trust` | Service name on every record |
//! | `VT_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `VT_JSON_LOGS` | `false` in development | JSON output |
//! | `VT_CONSOLE_OUTPUT` | `true` | Write records to stdout |
//! | `VT_ENVIRONMENT` | `development` | Deployment environment |

mod audit;
mod config;
mod logging;

pub use audit::{render_event, TracingAuditLogger, AUDIT_TARGET};
pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging, LoggingHandle};

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
