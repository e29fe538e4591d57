//! Configuration for the Redemption Token Subsystem

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Default `iat` clock-skew tolerance in seconds.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;

/// Token service configuration. One service instance is bound to one
/// algorithm, issuer and audience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenServiceConfig {
    /// JOSE algorithm (`ES256`, `ES384`, `ES512`, `ES256K`)
    pub algorithm: String,
    /// Expected and emitted `iss`
    pub issuer: String,
    /// Expected and emitted `aud`
    pub audience: String,
    /// TTL used when a call does not pass one; `None` issues non-expiring tokens
    #[serde(default)]
    pub default_ttl_secs: Option<i64>,
    /// `kid` placed in headers of tokens signed with caller-supplied keys
    #[serde(default)]
    pub key_id: Option<String>,
    /// Accepted `iat` lead over the verifier's clock
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,
}

fn default_clock_skew() -> u64 {
    DEFAULT_CLOCK_SKEW_SECS
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            algorithm: "ES256".to_string(),
            issuer: "voucher-trust".to_string(),
            audience: "voucher-redemption".to_string(),
            default_ttl_secs: None,
            key_id: None,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }
}

impl TokenServiceConfig {
    pub fn new(
        algorithm: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, ttl_secs: i64) -> Self {
        self.default_ttl_secs = Some(ttl_secs);
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_clock_skew(mut self, secs: u64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VT_TOKEN_ALGORITHM`: Signing algorithm (default: ES256)
    /// - `VT_TOKEN_ISSUER`: Issuer (default: voucher-trust)
    /// - `VT_TOKEN_AUDIENCE`: Audience (default: voucher-redemption)
    /// - `VT_TOKEN_DEFAULT_TTL`: Default TTL in seconds (default: none)
    /// - `VT_TOKEN_KEY_ID`: Header `kid` (default: none)
    /// - `VT_TOKEN_CLOCK_SKEW`: `iat` tolerance in seconds (default: 60)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| -> Option<i64> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(variable = key, value = %raw, "[vt-01] ignoring unparsable number");
                    None
                }
            }
        };

        Self {
            algorithm: lookup("VT_TOKEN_ALGORITHM").unwrap_or(defaults.algorithm),
            issuer: lookup("VT_TOKEN_ISSUER").unwrap_or(defaults.issuer),
            audience: lookup("VT_TOKEN_AUDIENCE").unwrap_or(defaults.audience),
            default_ttl_secs: parsed("VT_TOKEN_DEFAULT_TTL"),
            key_id: lookup("VT_TOKEN_KEY_ID").filter(|k| !k.is_empty()),
            clock_skew_secs: parsed("VT_TOKEN_CLOCK_SKEW")
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(defaults.clock_skew_secs),
        }
    }

    /// Non-empty issuer and audience, positive default TTL.
    ///
    /// The algorithm is checked when the service is built.
    pub fn validate(&self) -> Result<(), String> {
        if self.issuer.is_empty() {
            return Err("issuer must not be empty".to_string());
        }
        if self.audience.is_empty() {
            return Err("audience must not be empty".to_string());
        }
        if matches!(self.default_ttl_secs, Some(ttl) if ttl <= 0) {
            return Err("default TTL must be positive".to_string());
        }
        if self.clock_skew_secs > i64::MAX as u64 {
            return Err("clock skew out of range".to_string());
        }
        Ok(())
    }
}
