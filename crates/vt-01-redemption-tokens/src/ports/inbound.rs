//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::claims::VoucherClaims;
use crate::domain::errors::TokenError;
use crate::domain::validation::TokenValidation;
use crate::service::{BatchTokenVerification, DecodedToken};

/// Redemption token API.
///
/// Implementations must be thread-safe (`Send + Sync`). All operations are
/// CPU-bound and do not suspend.
pub trait TokenApi: Send + Sync {
    /// Build and sign a token. `ttl_secs` falls back to the configured
    /// default; with neither, the token has no `exp`.
    fn generate_token(
        &self,
        claims: &VoucherClaims,
        private_key: &[u8],
        ttl_secs: Option<i64>,
    ) -> Result<String, TokenError>;

    /// Parse without verifying. `None` for anything that is not three
    /// non-empty segments of valid base64url JSON.
    fn decode_token(&self, token: &str) -> Option<DecodedToken>;

    /// Full verification.
    ///
    /// # Errors
    /// * `TokenError::InvalidTokenFormat` / `InvalidTokenHeader` /
    ///   `InvalidTokenPayload` - the token cannot be parsed
    /// * `TokenError::TokenExpired` - the signature is good but `exp` has passed
    ///
    /// Every other rejection is an `Ok` with `is_valid == false`.
    fn verify_token(&self, token: &str, public_key: &[u8]) -> Result<TokenValidation, TokenError>;

    /// Verify many tokens against one key in parallel.
    fn batch_verify(&self, tokens: &[&str], public_key: &[u8]) -> BatchTokenVerification;
}
