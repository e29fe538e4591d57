//! # Redemption Token Subsystem (VT-01)
//!
//! Issues and verifies the compact ECDSA-signed tokens that authorize a
//! voucher redemption.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Claims, header, wire codec, validation rules
//! - **Ports Layer** (`ports/`): `TokenApi` (inbound), `SigningKeyProvider` (outbound)
//! - **Adapters Layer** (`adapters/`): `SigningKeyProvider` over the key manager
//! - **Service Layer** (`service.rs`): `TokenService`
//!
//! ## Wire Format
//!
//! ```text
//! base64url(JSON(header)) . base64url(JSON(payload)) . base64url(r || s)
//! ```
//!
//! No padding in any segment. `r` and `s` are fixed-width per curve
//! (32/48/66/32 bytes for P-256/P-384/P-521/secp256k1), never DER.
//!
//! ## Security Notes
//!
//! - A service accepts exactly one algorithm; `none`, `HS*` and other curves
//!   are reported as `ALGORITHM_MISMATCH` before the signature is looked at
//! - Expiry is a hard error (`TokenError::TokenExpired`); every other rejection
//!   is a `TokenValidation` with `is_valid == false`
//! - Audit events carry sanitized claims only (`uid` and `btc` are dropped)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::key_manager::KeyManagerProvider;
pub use config::TokenServiceConfig;
pub use domain::claims::{
    ClaimType, TokenPayload, VoucherClaims, MAX_REDEMPTION_LIMIT, MIN_REDEMPTION_LIMIT,
};
pub use domain::errors::TokenError;
pub use domain::header::TokenHeader;
pub use domain::validation::{TokenValidation, ValidationFailure};
pub use ports::inbound::TokenApi;
pub use ports::outbound::{
    KeyProviderError, SigningKeyProvider, SigningMaterial, VerificationMaterial,
};
pub use service::{BatchTokenVerification, DecodedToken, TokenOptions, TokenService};
