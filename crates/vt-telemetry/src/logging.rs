//! Structured logging.
//!
//! Records carry consistent fields so log pipelines can parse them:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `target`: Emitting module, `vt_audit` for audit records
//! - `subsystem`: Subsystem identifier (`vt-01`, `vt-02`, ...)
//! - `message`: Log message
//! - Additional context fields

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Handle returned once the global subscriber is installed.
#[derive(Debug)]
pub struct LoggingHandle {
    service_name: String,
    json: bool,
}

impl LoggingHandle {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Build the `EnvFilter` for a configuration.
///
/// `RUST_LOG` wins when set, matching what operators expect from other
/// tracing-based services.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Install the global `tracing` subscriber.
///
/// May be called once per process. A second call returns
/// [`TelemetryError::SubscriberInit`].
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingHandle, TelemetryError> {
    let env_filter = env_filter(config)?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        if config.console_output {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()
                .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .try_init()
                .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        }
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        if config.console_output {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .try_init()
                .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        }
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );

    Ok(LoggingHandle {
        service_name: config.service_name.clone(),
        json: config.json_logs,
    })
}

/// Record tagged with the emitting subsystem.
///
/// ```rust,ignore
/// log_event!(debug, "vt-01", "[vt-01] batch verified", total = 12, valid = 11);
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:ident, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Key lifecycle record: `subsystem`, lifecycle `op` and `key_id`.
#[macro_export]
macro_rules! log_key_event {
    ($level:ident, $subsystem:expr, $op:expr, $key_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            op = $op,
            key_id = %$key_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Token record: `subsystem` and voucher id. Never pass `uid` or `btc`.
#[macro_export]
macro_rules! log_token_event {
    ($level:ident, $subsystem:expr, $vid:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            vid = %$vid,
            $($($field)*,)?
            $msg
        )
    };
}
