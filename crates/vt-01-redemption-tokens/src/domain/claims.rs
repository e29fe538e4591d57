//! # Voucher Claims
//!
//! The payload of a redemption token. The claim shape is a sum type keyed by
//! `typ`, so a user token always carries `uid` and a print token always
//! carries `btc`, never both.
//!
//! ```json
//! {"typ":"user","vid":"v-1","uid":"u-1","iss":"...","aud":"...","iat":1700000000,"jti":"..."}
//! {"typ":"print","vid":"v-2","btc":"PIKA-2026-10-X7K","lmt":50,"iss":"...","aud":"...","iat":1700000000,"jti":"..."}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use vt_shared_types::SanitizedClaims;

/// Smallest accepted print redemption limit.
pub const MIN_REDEMPTION_LIMIT: u32 = 1;

/// Largest accepted print redemption limit.
pub const MAX_REDEMPTION_LIMIT: u32 = 10_000;

/// Token audience kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    /// Issued to one user
    User,
    /// Printed in a batch, redeemable up to `lmt` times
    Print,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::User => "user",
            ClaimType::Print => "print",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "lowercase")]
pub enum VoucherClaims {
    User {
        /// Voucher id
        vid: String,
        /// User id
        uid: String,
        /// Redeeming provider id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pid: Option<String>,
    },
    Print {
        /// Voucher id
        vid: String,
        /// Batch code
        btc: String,
        /// Redemption limit
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lmt: Option<u32>,
        /// Redeeming provider id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pid: Option<String>,
    },
}

impl VoucherClaims {
    pub fn user(vid: impl Into<String>, uid: impl Into<String>) -> Self {
        VoucherClaims::User {
            vid: vid.into(),
            uid: uid.into(),
            pid: None,
        }
    }

    pub fn print(vid: impl Into<String>, btc: impl Into<String>, lmt: Option<u32>) -> Self {
        VoucherClaims::Print {
            vid: vid.into(),
            btc: btc.into(),
            lmt,
            pid: None,
        }
    }

    /// Same claims with the provider id set.
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        match &mut self {
            VoucherClaims::User { pid, .. } | VoucherClaims::Print { pid, .. } => {
                *pid = Some(provider_id.into());
            }
        }
        self
    }

    pub fn claim_type(&self) -> ClaimType {
        match self {
            VoucherClaims::User { .. } => ClaimType::User,
            VoucherClaims::Print { .. } => ClaimType::Print,
        }
    }

    pub fn vid(&self) -> &str {
        match self {
            VoucherClaims::User { vid, .. } | VoucherClaims::Print { vid, .. } => vid,
        }
    }

    pub fn pid(&self) -> Option<&str> {
        match self {
            VoucherClaims::User { pid, .. } | VoucherClaims::Print { pid, .. } => pid.as_deref(),
        }
    }

    /// Redemption limit; print tokens only.
    pub fn lmt(&self) -> Option<u32> {
        match self {
            VoucherClaims::User { .. } => None,
            VoucherClaims::Print { lmt, .. } => *lmt,
        }
    }

    /// Check the value constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.vid().is_empty() {
            return Err("vid must not be empty".to_string());
        }
        match self {
            VoucherClaims::User { uid, .. } if uid.is_empty() => {
                Err("uid must not be empty".to_string())
            }
            VoucherClaims::Print { btc, .. } if btc.is_empty() => {
                Err("btc must not be empty".to_string())
            }
            VoucherClaims::Print { lmt: Some(lmt), .. }
                if !(MIN_REDEMPTION_LIMIT..=MAX_REDEMPTION_LIMIT).contains(lmt) =>
            {
                Err(format!(
                    "lmt must be in [{MIN_REDEMPTION_LIMIT}, {MAX_REDEMPTION_LIMIT}], got {lmt}"
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Full token payload: voucher claims plus registered claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(flatten)]
    pub claims: VoucherClaims,
    pub iss: String,
    pub aud: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Not-before, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Unique token id
    pub jti: String,
}

impl TokenPayload {
    pub fn vid(&self) -> &str {
        self.claims.vid()
    }

    /// Non-identifying subset for audit events. `uid` and `btc` are dropped.
    pub fn sanitized(&self) -> SanitizedClaims {
        SanitizedClaims {
            vid: self.claims.vid().to_string(),
            typ: self.claims.claim_type().to_string(),
            iss: self.iss.clone(),
            aud: self.aud.clone(),
            exp: self.exp,
            iat: self.iat,
            jti: self.jti.clone(),
            lmt: self.claims.lmt(),
        }
    }
}
