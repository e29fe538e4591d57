//! # Token Validation
//!
//! Structured outcome of token verification, plus the claim checks that run
//! after the signature is accepted. Expiry is not here: it is a hard error.

use crate::domain::claims::TokenPayload;
use crate::domain::header::TokenHeader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vt_crypto::Curve;
use vt_shared_types::ErrorCode;

/// Why a structurally sound token was not accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("Algorithm mismatch: expected {expected}, got {actual}")]
    AlgorithmMismatch { expected: String, actual: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token not valid before {nbf}")]
    NotYetValid { nbf: i64 },

    #[error("Token issued in the future ({iat})")]
    IssuedInFuture { iat: i64 },

    #[error("Issuer mismatch")]
    IssuerMismatch,

    #[error("Audience mismatch")]
    AudienceMismatch,

    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("Unknown key: {key_id}")]
    KeyNotFound { key_id: String },

    #[error("Key revoked: {key_id}")]
    KeyRevoked { key_id: String },

    #[error("Verification key unavailable: {message}")]
    KeyUnavailable { code: ErrorCode, message: String },

    #[error("Curve mismatch: expected {expected}, got {actual}")]
    CurveMismatch { expected: Curve, actual: Curve },
}

impl ValidationFailure {
    /// Stable caller-facing identifier.
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationFailure::AlgorithmMismatch { .. } => ErrorCode::AlgorithmMismatch,
            ValidationFailure::InvalidSignature => ErrorCode::InvalidSignature,
            ValidationFailure::NotYetValid { .. }
            | ValidationFailure::IssuedInFuture { .. }
            | ValidationFailure::IssuerMismatch
            | ValidationFailure::AudienceMismatch
            | ValidationFailure::InvalidClaims { .. }
            | ValidationFailure::MissingKeyId => ErrorCode::InvalidToken,
            ValidationFailure::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            ValidationFailure::KeyRevoked { .. } => ErrorCode::InvalidKey,
            ValidationFailure::KeyUnavailable { code, .. } => *code,
            ValidationFailure::CurveMismatch { .. } => ErrorCode::CurveMismatch,
        }
    }
}

/// Result of verifying one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub is_valid: bool,
    /// Present only when valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<TokenHeader>,
    /// Present only when valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TokenPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationFailure>,
}

impl TokenValidation {
    pub fn valid(header: TokenHeader, payload: TokenPayload) -> Self {
        Self {
            is_valid: true,
            header: Some(header),
            payload: Some(payload),
            error: None,
        }
    }

    pub fn invalid(error: ValidationFailure) -> Self {
        Self {
            is_valid: false,
            header: None,
            payload: None,
            error: Some(error),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(ValidationFailure::code)
    }
}

/// Expected values for the post-signature claim checks.
#[derive(Debug, Clone, Copy)]
pub struct ClaimExpectations<'a> {
    pub issuer: &'a str,
    pub audience: &'a str,
    pub clock_skew_secs: i64,
}

/// `nbf`, `iat`, `iss`, `aud` and value constraints, in that order.
pub fn check_claims(
    payload: &TokenPayload,
    expected: &ClaimExpectations<'_>,
    now: i64,
) -> Result<(), ValidationFailure> {
    if let Some(nbf) = payload.nbf {
        if now < nbf {
            return Err(ValidationFailure::NotYetValid { nbf });
        }
    }
    if payload.iat > now.saturating_add(expected.clock_skew_secs) {
        return Err(ValidationFailure::IssuedInFuture { iat: payload.iat });
    }
    if payload.iss != expected.issuer {
        return Err(ValidationFailure::IssuerMismatch);
    }
    if payload.aud != expected.audience {
        return Err(ValidationFailure::AudienceMismatch);
    }
    payload
        .claims
        .validate()
        .map_err(|message| ValidationFailure::InvalidClaims { message })
}

/// `true` when `now >= exp`.
pub fn is_expired(payload: &TokenPayload, now: i64) -> bool {
    payload.exp.is_some_and(|exp| now >= exp)
}
