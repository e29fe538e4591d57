//! Crypto error types.

use crate::curve::Curve;
use thiserror::Error;
use vt_shared_types::ErrorCode;

/// Cryptographic operation errors.
///
/// Messages never include key bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Requested length outside the accepted range
    #[error("Invalid length: {actual} not in [{min}, {max}]")]
    InvalidLength {
        /// Smallest accepted length
        min: usize,
        /// Largest accepted length
        max: usize,
        /// Length that was requested
        actual: usize,
    },

    /// No character class was enabled
    #[error("Invalid charset: at least one character class must be enabled")]
    InvalidCharset,

    /// Unknown string encoding
    #[error("Unsupported encoding: {0}")]
    InvalidEncoding(String),

    /// Caller input rejected before any cryptographic work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed or out-of-range key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature could not be parsed or encoded
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Material belongs to a different curve
    #[error("Curve mismatch: expected {expected}, got {actual}")]
    CurveMismatch {
        /// Curve the engine is bound to
        expected: Curve,
        /// Curve of the supplied material
        actual: Curve,
    },

    /// Entropy source or key generation failure
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl CryptoError {
    /// Stable caller-facing identifier.
    pub fn code(&self) -> ErrorCode {
        match self {
            CryptoError::InvalidLength { .. }
            | CryptoError::InvalidCharset
            | CryptoError::InvalidEncoding(_)
            | CryptoError::InvalidInput(_) => ErrorCode::InvalidInput,
            CryptoError::InvalidKey(_) => ErrorCode::InvalidKey,
            CryptoError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            CryptoError::CurveMismatch { .. } => ErrorCode::CurveMismatch,
            CryptoError::GenerationFailed(_) => ErrorCode::GenerationFailed,
        }
    }

    pub(crate) fn length(min: usize, max: usize, actual: usize) -> Self {
        CryptoError::InvalidLength { min, max, actual }
    }
}
