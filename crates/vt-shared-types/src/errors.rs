//! # Stable Error Codes
//!
//! Every subsystem error maps onto one of these identifiers. Callers (HTTP
//! controllers, workflow engines) branch on the code, never on the Rust type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable, caller-facing error identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or out-of-range key material
    InvalidKey,
    /// Signature failed verification or could not be parsed
    InvalidSignature,
    /// Token is malformed or failed a claim check
    InvalidToken,
    /// No key stored under the requested identifier
    KeyNotFound,
    /// Key is past its lifetime (or revoked) for the requested use
    KeyExpired,
    /// Token `exp` has passed
    TokenExpired,
    /// Key material belongs to a different curve than expected
    CurveMismatch,
    /// Token header algorithm differs from the configured one
    AlgorithmMismatch,
    /// Key rotation could not be applied
    RotationFailed,
    /// Random or key generation failed
    GenerationFailed,
    /// Caller input rejected before any cryptographic work
    InvalidInput,
}

impl ErrorCode {
    /// Wire identifier, e.g. `"INVALID_KEY"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidKey => "INVALID_KEY",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::KeyNotFound => "KEY_NOT_FOUND",
            ErrorCode::KeyExpired => "KEY_EXPIRED",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::CurveMismatch => "CURVE_MISMATCH",
            ErrorCode::AlgorithmMismatch => "ALGORITHM_MISMATCH",
            ErrorCode::RotationFailed => "ROTATION_FAILED",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
            ErrorCode::InvalidInput => "INVALID_INPUT",
        }
    }

    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::InvalidKey,
        ErrorCode::InvalidSignature,
        ErrorCode::InvalidToken,
        ErrorCode::KeyNotFound,
        ErrorCode::KeyExpired,
        ErrorCode::TokenExpired,
        ErrorCode::CurveMismatch,
        ErrorCode::AlgorithmMismatch,
        ErrorCode::RotationFailed,
        ErrorCode::GenerationFailed,
        ErrorCode::InvalidInput,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown error code identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}
