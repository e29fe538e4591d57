//! # Key Management Errors
//!
//! Error types for key storage and lifecycle operations.

use crate::domain::entities::KeyStatus;
use thiserror::Error;
use vt_crypto::{CryptoError, Curve};
use vt_shared_types::ErrorCode;

/// Errors reported by a [`KeyStorage`](crate::ports::outbound::KeyStorage) backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A record with this id already exists
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// No record with this id
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Backend could not complete the operation
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Errors that can occur during key management.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyManagerError {
    /// No key stored under the identifier
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// No active signing key (for the requested curve, if any)
    #[error("No active signing key{}", .0.map(|c| format!(" for {c}")).unwrap_or_default())]
    NoActiveKey(Option<Curve>),

    /// Identifier already taken
    #[error("Key already exists: {0}")]
    KeyExists(String),

    /// Key is past its lifetime for the requested use
    #[error("Key expired: {0}")]
    KeyExpired(String),

    /// Key was revoked and must not be used
    #[error("Key revoked: {0}")]
    KeyRevoked(String),

    /// Lifecycle transition not allowed from the current status
    #[error("Invalid transition for {key_id}: {from} -> {to}")]
    InvalidTransition {
        key_id: String,
        from: KeyStatus,
        to: KeyStatus,
    },

    /// Successor key does not match the curve of the key it replaces
    #[error("Curve mismatch: expected {expected}, got {actual}")]
    CurveMismatch { expected: Curve, actual: Curve },

    /// Rotation could not be applied
    #[error("Rotation failed: {0}")]
    RotationFailed(String),

    /// Rotation policy rejected
    #[error("Invalid rotation policy: {0}")]
    InvalidPolicy(String),

    /// Backend failure outside rotation
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Key generation or parsing failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<StorageError> for KeyManagerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => KeyManagerError::KeyNotFound(id),
            StorageError::AlreadyExists(id) => KeyManagerError::KeyExists(id),
            other => KeyManagerError::Storage(other),
        }
    }
}

impl KeyManagerError {
    /// Stable caller-facing identifier.
    pub fn code(&self) -> ErrorCode {
        match self {
            KeyManagerError::KeyNotFound(_) | KeyManagerError::NoActiveKey(_) => {
                ErrorCode::KeyNotFound
            }
            KeyManagerError::KeyExpired(_) => ErrorCode::KeyExpired,
            KeyManagerError::KeyRevoked(_) => ErrorCode::InvalidKey,
            KeyManagerError::KeyExists(_) | KeyManagerError::InvalidPolicy(_) => {
                ErrorCode::InvalidInput
            }
            KeyManagerError::CurveMismatch { .. } => ErrorCode::CurveMismatch,
            KeyManagerError::InvalidTransition { .. }
            | KeyManagerError::RotationFailed(_)
            | KeyManagerError::Storage(_) => ErrorCode::RotationFailed,
            KeyManagerError::Crypto(e) => e.code(),
        }
    }
}
