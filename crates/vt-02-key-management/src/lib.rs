//! # Key Management Subsystem (VT-02)
//!
//! Stores, rotates and audits the signing keys behind redemption tokens.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Key records, lifecycle rules, errors
//! - **Ports Layer** (`ports/`): `KeyManagementApi` (inbound), `KeyStorage` (outbound)
//! - **Adapters Layer** (`adapters/`): In-memory `KeyStorage`
//! - **Service Layer** (`service.rs`): `KeyManager`, wiring policy, storage and audit
//!
//! ## Lifecycle
//!
//! Keys are stored `active`. Rotation marks the predecessor `rotating`; it keeps
//! verifying for the overlap window. The owner-driven sweep moves keys past
//! `max_age + overlap` (or past their overlap window) to `expired`. Expired keys
//! stay available for verification lookups but are never chosen for signing.
//! `revoke` is the only way to stop verification with a key.
//!
//! ## Security Notes
//!
//! - Private scalars are zeroized on drop and redacted from `Debug`
//! - Listings and public-key lookups never expose private material
//! - Every transition emits a `SecurityAuditEvent`

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::memory::InMemoryKeyStorage;
pub use config::KeyRotationPolicy;
pub use domain::entities::{
    KeyFilter, KeyMetadata, KeyRecord, KeyStatistics, KeyStatus, KeySummary, PublicKeyInfo,
    SweepReport,
};
pub use domain::errors::{KeyManagerError, StorageError};
pub use ports::inbound::KeyManagementApi;
pub use ports::outbound::KeyStorage;
pub use service::KeyManager;
