//! # Redemption Token Service
//!
//! Application service layer that implements the `TokenApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`TokenApi`)
//! - Uses the outbound port (`SigningKeyProvider`) when keys are resolved by id
//! - Delegates signatures to `vt_crypto::EcdsaEngine` and claim rules to the domain layer
//!
//! ## Verification Pipeline
//!
//! | Step | Check | Outcome on failure |
//! |------|-------|--------------------|
//! | 1 | three non-empty segments | `Err(InvalidTokenFormat)` |
//! | 2 | header JSON, `typ` is `JWT` | `Err(InvalidTokenHeader)` |
//! | 3 | payload JSON, no claim foreign to its `typ` | `Err(InvalidTokenPayload)` |
//! | 4 | `alg` equals configured algorithm | `Ok(invalid)`, `ALGORITHM_MISMATCH` |
//! | 5 | ECDSA signature | `Ok(invalid)`, `INVALID_SIGNATURE` |
//! | 6 | `now < exp` | `Err(TokenExpired)` |
//! | 7-9 | `nbf`, `iat` skew, `iss`/`aud`, claim values | `Ok(invalid)`, `INVALID_TOKEN` |

use crate::config::TokenServiceConfig;
use crate::domain::claims::{TokenPayload, VoucherClaims};
use crate::domain::encoding::{decode_segment, encode_segment, signing_input, TokenSegments};
use crate::domain::errors::TokenError;
use crate::domain::header::{TokenHeader, TOKEN_TYPE};
use crate::domain::validation::{
    check_claims, is_expired, ClaimExpectations, TokenValidation, ValidationFailure,
};
use crate::ports::inbound::TokenApi;
use crate::ports::outbound::{KeyProviderError, SigningKeyProvider};
use rayon::prelude::*;
use std::sync::Arc;
use vt_crypto::{Curve, EcdsaEngine, SecureRandom};
use vt_shared_types::{
    AuditEventType, AuditLogger, AuditSeverity, Clock, ErrorCode, NoopAuditLogger,
    SecurityAuditEvent, SystemClock, TokenOperationDetails, ViolationKind,
};
use vt_telemetry::{log_event, log_token_event};

const SUBSYSTEM: &str = "vt-01";

/// Length of the `jti` claim.
pub const JTI_LENGTH: usize = 16;

// =============================================================================
// SERVICE TYPES
// =============================================================================

/// Per-call issuance options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Lifetime in seconds; falls back to the configured default
    pub ttl_secs: Option<i64>,
    /// Absolute `nbf`, seconds since the Unix epoch
    pub not_before: Option<i64>,
    /// Header `kid`; falls back to the configured key id
    pub key_id: Option<String>,
}

/// A parsed but unverified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub payload: TokenPayload,
    /// Compact `r || s` bytes
    pub signature: Vec<u8>,
    /// `<header>.<payload>` exactly as received
    pub signing_input: String,
}

/// Outcome of [`TokenApi::batch_verify`], in input order.
#[derive(Debug, Clone)]
pub struct BatchTokenVerification {
    pub results: Vec<Result<TokenValidation, TokenError>>,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl BatchTokenVerification {
    fn from_results(results: Vec<Result<TokenValidation, TokenError>>) -> Self {
        let valid_count = results
            .iter()
            .filter(|r| matches!(r, Ok(v) if v.is_valid))
            .count();
        let invalid_count = results.len() - valid_count;
        Self {
            results,
            valid_count,
            invalid_count,
        }
    }

    pub fn all_valid(&self) -> bool {
        self.invalid_count == 0
    }
}

// =============================================================================
// TOKEN SERVICE
// =============================================================================

/// Redemption token service bound to one algorithm, issuer and audience.
pub struct TokenService {
    config: TokenServiceConfig,
    curve: Curve,
    engine: EcdsaEngine,
    random: SecureRandom,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Errors
    /// * `TokenError::InvalidConfig` - empty issuer/audience or non-positive default TTL
    /// * `TokenError::UnsupportedAlgorithm` - `algorithm` is not `ES256`, `ES384`,
    ///   `ES512` or `ES256K`. Symmetric algorithms are never accepted.
    pub fn new(config: TokenServiceConfig) -> Result<Self, TokenError> {
        config.validate().map_err(TokenError::InvalidConfig)?;
        let curve = Curve::from_algorithm(&config.algorithm)
            .map_err(|_| TokenError::UnsupportedAlgorithm(config.algorithm.clone()))?;

        log_event!(
            info,
            SUBSYSTEM,
            "[vt-01] token service configured",
            algorithm = %config.algorithm,
            issuer = %config.issuer,
            audience = %config.audience
        );

        Ok(Self {
            config,
            curve,
            engine: EcdsaEngine::new(curve),
            random: SecureRandom::new(),
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoopAuditLogger),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Curve implied by the configured algorithm.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Build and sign a token with explicit options.
    pub fn generate_token_with(
        &self,
        claims: &VoucherClaims,
        private_key: &[u8],
        options: TokenOptions,
    ) -> Result<String, TokenError> {
        claims.validate().map_err(TokenError::InvalidClaims)?;

        let now = self.clock.unix_now();
        let exp = match options.ttl_secs.or(self.config.default_ttl_secs) {
            Some(ttl) => Some(
                now.checked_add(ttl)
                    .ok_or_else(|| TokenError::InvalidClaims(format!("ttl {ttl} out of range")))?,
            ),
            None => None,
        };

        let header = TokenHeader::new(
            self.config.algorithm.clone(),
            options.key_id.or_else(|| self.config.key_id.clone()),
        );
        let payload = TokenPayload {
            claims: claims.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            exp,
            nbf: options.not_before,
            jti: self.new_jti(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        let payload_json =
            serde_json::to_vec(&payload).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        let input = signing_input(&encode_segment(&header_json), &encode_segment(&payload_json));

        let signature = self
            .engine
            .sign(input.as_bytes(), private_key)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        log_token_event!(
            debug,
            SUBSYSTEM,
            payload.vid(),
            "[vt-01] token issued",
            typ = %payload.claims.claim_type(),
            jti = %payload.jti
        );
        self.emit_token(
            AuditEventType::TokenGenerated,
            header.kid.clone(),
            "generate",
            Some(&payload),
            None,
        );

        Ok(format!("{input}.{}", encode_segment(&signature.to_compact())))
    }

    /// Sign with the provider's active key for the configured curve. The
    /// header `kid` names that key.
    pub async fn issue_with_key_provider<P>(
        &self,
        provider: &P,
        claims: &VoucherClaims,
        ttl_secs: Option<i64>,
    ) -> Result<String, TokenError>
    where
        P: SigningKeyProvider + ?Sized,
    {
        let material =
            provider
                .signing_key(self.curve)
                .await
                .map_err(|e| TokenError::KeyUnavailable {
                    code: e.code(),
                    message: e.to_string(),
                })?;
        if material.curve != self.curve {
            return Err(TokenError::CurveMismatch {
                expected: self.curve,
                actual: material.curve,
            });
        }

        self.generate_token_with(
            claims,
            material.private_key.as_bytes(),
            TokenOptions {
                ttl_secs,
                not_before: None,
                key_id: Some(material.key_id),
            },
        )
    }

    /// Verify with the key named by the header `kid` (or the configured key
    /// id). Unknown, revoked and cross-curve keys are reported as invalid
    /// results.
    pub async fn verify_with_key_provider<P>(
        &self,
        token: &str,
        provider: &P,
    ) -> Result<TokenValidation, TokenError>
    where
        P: SigningKeyProvider + ?Sized,
    {
        let decoded = self.parse_reporting(token)?;
        if let Some(rejected) = self.check_algorithm(&decoded) {
            return Ok(rejected);
        }

        let Some(key_id) = decoded
            .header
            .kid
            .clone()
            .or_else(|| self.config.key_id.clone())
        else {
            return Ok(self.reject(&decoded, ValidationFailure::MissingKeyId));
        };

        let material = match provider.verification_key(&key_id).await {
            Ok(material) => material,
            Err(KeyProviderError::NotFound(_)) => {
                return Ok(self.reject(&decoded, ValidationFailure::KeyNotFound { key_id }));
            }
            Err(KeyProviderError::Revoked(_)) => {
                self.emit_violation(
                    Some(key_id.clone()),
                    ViolationKind::RevokedKeyUse,
                    "token presented for a revoked key",
                );
                return Ok(self.reject(&decoded, ValidationFailure::KeyRevoked { key_id }));
            }
            Err(KeyProviderError::Unavailable { code, message }) => {
                return Ok(self.reject(&decoded, ValidationFailure::KeyUnavailable { code, message }));
            }
        };

        if material.curve != self.curve {
            self.emit_violation(
                Some(key_id),
                ViolationKind::CurveMismatch,
                format!(
                    "{} token resolved to a {} key",
                    self.config.algorithm, material.curve
                ),
            );
            return Ok(self.reject(
                &decoded,
                ValidationFailure::CurveMismatch {
                    expected: self.curve,
                    actual: material.curve,
                },
            ));
        }

        self.check_signature_and_claims(decoded, &material.public_key)
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Steps 1-3.
    fn parse(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let segments = TokenSegments::split(token).ok_or(TokenError::InvalidTokenFormat)?;

        let header_bytes = decode_segment(segments.header)
            .ok_or_else(|| TokenError::InvalidTokenHeader("not base64url".to_string()))?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| TokenError::InvalidTokenHeader(json_failure(&e)))?;
        if header.typ != TOKEN_TYPE {
            return Err(TokenError::InvalidTokenHeader(format!(
                "typ must be {TOKEN_TYPE}"
            )));
        }

        let payload_bytes = decode_segment(segments.payload)
            .ok_or_else(|| TokenError::InvalidTokenPayload("not base64url".to_string()))?;
        let raw: serde_json::Value = serde_json::from_slice(&payload_bytes)
            .map_err(|e| TokenError::InvalidTokenPayload(json_failure(&e)))?;
        if let Some(field) = foreign_claim(&raw) {
            return Err(TokenError::InvalidTokenPayload(format!(
                "{field} does not belong to this token type"
            )));
        }
        let payload: TokenPayload = serde_json::from_value(raw)
            .map_err(|e| TokenError::InvalidTokenPayload(json_failure(&e)))?;

        let signature = decode_segment(segments.signature).ok_or(TokenError::InvalidTokenFormat)?;

        Ok(DecodedToken {
            header,
            payload,
            signature,
            signing_input: segments.signing_input(),
        })
    }

    /// [`parse`](Self::parse), reporting malformed input as a violation.
    fn parse_reporting(&self, token: &str) -> Result<DecodedToken, TokenError> {
        self.parse(token).map_err(|e| {
            log_event!(warn, SUBSYSTEM, "[vt-01] malformed token rejected", error = %e);
            self.emit_violation(None, ViolationKind::MalformedToken, e.to_string());
            e
        })
    }

    /// Step 4.
    fn check_algorithm(&self, decoded: &DecodedToken) -> Option<TokenValidation> {
        if decoded.header.alg == self.config.algorithm {
            return None;
        }
        self.emit_violation(
            decoded.header.kid.clone(),
            ViolationKind::AlgorithmConfusion,
            format!(
                "header alg {:?} where {} is required",
                decoded.header.alg, self.config.algorithm
            ),
        );
        Some(self.reject(
            decoded,
            ValidationFailure::AlgorithmMismatch {
                expected: self.config.algorithm.clone(),
                actual: decoded.header.alg.clone(),
            },
        ))
    }

    /// Steps 5-9.
    fn check_signature_and_claims(
        &self,
        decoded: DecodedToken,
        public_key: &[u8],
    ) -> Result<TokenValidation, TokenError> {
        if !self.engine.verify_compact(
            decoded.signing_input.as_bytes(),
            &decoded.signature,
            public_key,
        ) {
            self.emit_violation(
                decoded.header.kid.clone(),
                ViolationKind::SignatureTampering,
                format!("signature check failed for vid {}", decoded.payload.vid()),
            );
            return Ok(self.reject(&decoded, ValidationFailure::InvalidSignature));
        }

        let now = self.clock.unix_now();
        if is_expired(&decoded.payload, now) {
            let exp = decoded.payload.exp.unwrap_or(now);
            let error = TokenError::TokenExpired { exp };
            log_token_event!(debug, SUBSYSTEM, decoded.payload.vid(), "[vt-01] expired token", exp);
            self.emit_token(
                AuditEventType::TokenRejected,
                decoded.header.kid.clone(),
                "verify",
                Some(&decoded.payload),
                Some(error.code()),
            );
            return Err(error);
        }

        let expected = ClaimExpectations {
            issuer: &self.config.issuer,
            audience: &self.config.audience,
            clock_skew_secs: i64::try_from(self.config.clock_skew_secs).unwrap_or(i64::MAX),
        };
        if let Err(failure) = check_claims(&decoded.payload, &expected, now) {
            return Ok(self.reject(&decoded, failure));
        }

        self.emit_token(
            AuditEventType::TokenVerified,
            decoded.header.kid.clone(),
            "verify",
            Some(&decoded.payload),
            None,
        );
        Ok(TokenValidation::valid(decoded.header, decoded.payload))
    }

    fn reject(&self, decoded: &DecodedToken, failure: ValidationFailure) -> TokenValidation {
        log_token_event!(
            debug,
            SUBSYSTEM,
            decoded.payload.vid(),
            "[vt-01] token rejected",
            reason = %failure
        );
        self.emit_token(
            AuditEventType::TokenRejected,
            decoded.header.kid.clone(),
            "verify",
            Some(&decoded.payload),
            Some(failure.code()),
        );
        TokenValidation::invalid(failure)
    }

    /// Hyphen-free UUID v4 prefix.
    fn new_jti(&self) -> String {
        self.random
            .uuid_v4()
            .chars()
            .filter(|c| *c != '-')
            .take(JTI_LENGTH)
            .collect()
    }

    // =========================================================================
    // AUDIT
    // =========================================================================

    fn emit_token(
        &self,
        event_type: AuditEventType,
        key_id: Option<String>,
        operation: &str,
        payload: Option<&TokenPayload>,
        error_code: Option<ErrorCode>,
    ) {
        let severity = if error_code.is_some() {
            AuditSeverity::Warning
        } else {
            AuditSeverity::Info
        };
        let details = TokenOperationDetails {
            operation: operation.to_string(),
            algorithm: self.config.algorithm.clone(),
            claims: payload.map(TokenPayload::sanitized),
            success: error_code.is_none(),
            error_code: error_code.map(|c| c.as_str().to_string()),
        };
        self.audit.log(SecurityAuditEvent::token(
            self.clock.now(),
            event_type,
            key_id,
            details,
            severity,
        ));
    }

    fn emit_violation(
        &self,
        key_id: Option<String>,
        violation: ViolationKind,
        description: impl Into<String>,
    ) {
        let description = description.into();
        log_event!(
            warn,
            SUBSYSTEM,
            "[vt-01] security violation",
            ?violation,
            %description
        );
        self.audit.log(SecurityAuditEvent::violation(
            self.clock.now(),
            key_id,
            violation,
            description,
        ));
    }
}

impl TokenApi for TokenService {
    fn generate_token(
        &self,
        claims: &VoucherClaims,
        private_key: &[u8],
        ttl_secs: Option<i64>,
    ) -> Result<String, TokenError> {
        self.generate_token_with(
            claims,
            private_key,
            TokenOptions {
                ttl_secs,
                ..TokenOptions::default()
            },
        )
    }

    fn decode_token(&self, token: &str) -> Option<DecodedToken> {
        self.parse(token).ok()
    }

    fn verify_token(&self, token: &str, public_key: &[u8]) -> Result<TokenValidation, TokenError> {
        let decoded = self.parse_reporting(token)?;
        if let Some(rejected) = self.check_algorithm(&decoded) {
            return Ok(rejected);
        }
        self.check_signature_and_claims(decoded, public_key)
    }

    fn batch_verify(&self, tokens: &[&str], public_key: &[u8]) -> BatchTokenVerification {
        let results: Vec<_> = tokens
            .par_iter()
            .map(|token| self.verify_token(token, public_key))
            .collect();
        let batch = BatchTokenVerification::from_results(results);
        log_event!(
            debug,
            SUBSYSTEM,
            "[vt-01] batch verification complete",
            total = tokens.len(),
            valid = batch.valid_count
        );
        batch
    }
}

/// Error category and position only. serde_json messages quote the offending
/// value, which may be a user id.
fn json_failure(error: &serde_json::Error) -> String {
    let category = match error.classify() {
        serde_json::error::Category::Io => "unreadable",
        serde_json::error::Category::Syntax => "malformed JSON",
        serde_json::error::Category::Data => "unexpected claim shape",
        serde_json::error::Category::Eof => "truncated JSON",
    };
    match error.line() {
        // values rebuilt from a parsed tree carry no position
        0 => category.to_string(),
        line => format!("{category} at line {line} column {}", error.column()),
    }
}

/// A claim that is only legal on the other token type.
fn foreign_claim(raw: &serde_json::Value) -> Option<&'static str> {
    let has = |field: &str| raw.get(field).is_some();
    match raw.get("typ").and_then(serde_json::Value::as_str) {
        Some("user") if has("btc") => Some("btc"),
        Some("user") if has("lmt") => Some("lmt"),
        Some("print") if has("uid") => Some("uid"),
        _ => None,
    }
}
