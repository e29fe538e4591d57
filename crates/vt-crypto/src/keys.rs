//! Key material value types.

use crate::curve::Curve;
use crate::errors::CryptoError;
use crate::random::constant_time_equal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Encoding of key material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// Private scalar bytes / SEC1 compressed point
    Raw,
    /// PEM armour (`PUBLIC KEY`, `EC PRIVATE KEY`)
    Pem,
    /// ASN.1 DER
    Der,
}

/// Raw private scalar. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(#[serde(with = "hex::serde")] Vec<u8>);

impl PrivateKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_equal(&self.0, &other.0)
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED; {}])", self.0.len())
    }
}

/// Deterministic key identifier: curve tag plus the first 16 hex characters
/// of SHA-256 over the compressed public key, e.g. `p256-3f9a0c1b2d4e5f60`.
pub fn derive_key_id(curve: Curve, public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    let mut id = hex::encode(&digest[..8]);
    id.insert(0, '-');
    id.insert_str(0, curve.params().key_tag);
    id
}

/// An elliptic-curve key pair. Immutable once built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    private_key: PrivateKey,
    #[serde(with = "hex::serde")]
    public_key: Vec<u8>,
    curve: Curve,
    format: KeyFormat,
    created_at: DateTime<Utc>,
    key_id: Option<String>,
}

impl KeyPair {
    /// Assemble from raw parts, checking curve-determined lengths only.
    ///
    /// Use `EcdsaEngine::key_pair_from_private` to also check that the
    /// public key belongs to the private scalar.
    pub fn from_raw(
        curve: Curve,
        private_key: PrivateKey,
        public_key: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CryptoError> {
        if private_key.len() != curve.private_key_len() {
            return Err(CryptoError::InvalidKey(format!(
                "{curve} private key must be {} bytes, got {}",
                curve.private_key_len(),
                private_key.len()
            )));
        }
        if public_key.len() != curve.public_key_len() {
            return Err(CryptoError::InvalidKey(format!(
                "{curve} compressed public key must be {} bytes, got {}",
                curve.public_key_len(),
                public_key.len()
            )));
        }
        Ok(Self {
            private_key,
            public_key,
            curve,
            format: KeyFormat::Raw,
            created_at,
            key_id: None,
        })
    }

    /// Copy of this pair carrying an explicit identifier.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Explicit identifier, if one was assigned.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Explicit identifier or the one derived from the public key.
    pub fn resolved_key_id(&self) -> String {
        self.key_id
            .clone()
            .unwrap_or_else(|| derive_key_id(self.curve, &self.public_key))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &self.curve)
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &self.private_key)
            .field("created_at", &self.created_at)
            .field("key_id", &self.key_id)
            .finish()
    }
}
