//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for structured logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every record
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `info,vt_audit=warn`
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Deployment environment (development, staging, production)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "voucher-trust".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "development".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VT_SERVICE_NAME`: Service name (default: voucher-trust)
    /// - `VT_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `VT_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `VT_JSON_LOGS`: Enable JSON logs (default: true outside development)
    /// - `VT_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("VT_ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let is_development = environment.eq_ignore_ascii_case("development");

        Self {
            service_name: lookup("VT_SERVICE_NAME").unwrap_or_else(|| "voucher-trust".to_string()),

            log_level: lookup("VT_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("VT_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("VT_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(!is_development),

            environment,
        }
    }

    /// Configuration for one subsystem, e.g. `for_subsystem("01", "redemption-tokens")`.
    pub fn for_subsystem(subsystem_id: &str, subsystem_name: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("vt-{}-{}", subsystem_id, subsystem_name);
        config
    }
}
