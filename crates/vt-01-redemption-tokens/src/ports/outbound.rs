//! # Outbound Ports (Driven Ports / SPI)
//!
//! Key lookup for issuing and verifying tokens without handling raw key
//! material at the call site.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use vt_crypto::{Curve, PrivateKey};
use vt_shared_types::ErrorCode;

/// Private key selected for signing.
#[derive(Clone)]
pub struct SigningMaterial {
    pub key_id: String,
    pub curve: Curve,
    pub private_key: PrivateKey,
}

impl fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("key_id", &self.key_id)
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

/// Public key resolved from a token's `kid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationMaterial {
    pub key_id: String,
    pub curve: Curve,
    pub public_key: Vec<u8>,
}

/// Error from key lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyProviderError {
    /// No usable key under this id / for this curve
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key exists but was revoked
    #[error("Key revoked: {0}")]
    Revoked(String),

    /// Any other provider failure
    #[error("Key provider failure: {message}")]
    Unavailable { code: ErrorCode, message: String },
}

impl KeyProviderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            KeyProviderError::NotFound(_) => ErrorCode::KeyNotFound,
            KeyProviderError::Revoked(_) => ErrorCode::InvalidKey,
            KeyProviderError::Unavailable { code, .. } => *code,
        }
    }
}

/// Source of signing and verification keys.
#[async_trait]
pub trait SigningKeyProvider: Send + Sync {
    /// Current signing key for `curve`.
    async fn signing_key(&self, curve: Curve) -> Result<SigningMaterial, KeyProviderError>;

    /// Verification key for `key_id`. Superseded and expired keys still
    /// qualify; revoked keys do not.
    async fn verification_key(&self, key_id: &str)
        -> Result<VerificationMaterial, KeyProviderError>;
}
