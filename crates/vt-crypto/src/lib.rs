//! # VT Crypto - Voucher Trust Primitives
//!
//! ## Components
//!
//! | Module | Provides | Use Case |
//! |--------|----------|----------|
//! | `random` | OS CSPRNG bytes, strings, numeric codes | Nonces, identifiers |
//! | `codes` | Short, batch, check-digit and expiring codes | Human-facing voucher codes |
//! | `curve` | P-256, P-384, P-521, secp256k1 constants | Curve parameterisation |
//! | `ecdsa` | Multi-curve ECDSA engine | Token signatures |
//! | `keys` | Zeroizing key material | Key storage |
//!
//! ## Security Properties
//!
//! - **Randomness**: every draw comes from the operating system CSPRNG
//! - **ECDSA**: RFC 6979 deterministic, low-S normalization, high-S rejected
//! - **Comparison**: constant-time for codes, secrets and signatures
//! - **Secrets**: private scalars are zeroized on drop and redacted in logs

#![warn(clippy::all)]

pub mod codes;
pub mod curve;
pub mod ecdsa;
pub mod errors;
pub mod keys;
pub mod random;

// Re-exports
pub use codes::{
    compute_check_digit, parse_batch_code, validate_check_digit, BatchCode, BatchCodeOptions,
    CodeGenerator, ExpiringCode, ShortCodeOptions,
};
pub use curve::{Curve, CurveParams};
pub use ecdsa::{
    BatchVerificationResult, EcdsaEngine, Signature, SignatureFormat, VerificationItem,
};
pub use errors::CryptoError;
pub use keys::{derive_key_id, KeyFormat, KeyPair, PrivateKey};
pub use random::{constant_time_equal, CharsetOptions, RandomEncoding, SecureRandom};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
