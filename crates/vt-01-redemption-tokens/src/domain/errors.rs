//! # Token Errors
//!
//! Hard failures of the token service. Expected-shape verification failures
//! are not errors; they are reported as a
//! [`TokenValidation`](crate::domain::validation::TokenValidation).

use thiserror::Error;
use vt_crypto::Curve;
use vt_shared_types::ErrorCode;

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not three non-empty dot-separated segments
    #[error("Invalid token format")]
    InvalidTokenFormat,

    /// Header segment is not base64url JSON of a header
    #[error("Invalid token header: {0}")]
    InvalidTokenHeader(String),

    /// Payload segment is not base64url JSON of a payload
    #[error("Invalid token payload: {0}")]
    InvalidTokenPayload(String),

    /// `now >= exp`
    #[error("Token expired at {exp}")]
    TokenExpired { exp: i64 },

    /// Configured algorithm is not in the ECDSA family
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signing failed on the supplied key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Claims rejected before signing
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// Service configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resolved key belongs to another curve than the configured algorithm
    #[error("Curve mismatch: expected {expected}, got {actual}")]
    CurveMismatch { expected: Curve, actual: Curve },

    /// Key provider could not supply a signing key
    #[error("Signing key unavailable: {message}")]
    KeyUnavailable { code: ErrorCode, message: String },
}

impl TokenError {
    /// Stable caller-facing identifier.
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenError::InvalidTokenFormat
            | TokenError::InvalidTokenHeader(_)
            | TokenError::InvalidTokenPayload(_) => ErrorCode::InvalidToken,
            TokenError::TokenExpired { .. } => ErrorCode::TokenExpired,
            TokenError::UnsupportedAlgorithm(_) => ErrorCode::AlgorithmMismatch,
            TokenError::InvalidKey(_) => ErrorCode::InvalidKey,
            TokenError::InvalidClaims(_) | TokenError::InvalidConfig(_) => ErrorCode::InvalidInput,
            TokenError::CurveMismatch { .. } => ErrorCode::CurveMismatch,
            TokenError::KeyUnavailable { code, .. } => *code,
        }
    }
}
