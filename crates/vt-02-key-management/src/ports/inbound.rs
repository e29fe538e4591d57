//! # Inbound Ports (Driving Ports / API)
//!
//! Public API of the key management subsystem.

use crate::domain::entities::{
    KeyFilter, KeyMetadata, KeyRecord, KeyStatistics, KeySummary, PublicKeyInfo, SweepReport,
};
use crate::domain::errors::KeyManagerError;
use async_trait::async_trait;
use vt_crypto::{Curve, KeyPair};

/// Key management API.
///
/// Implementations must be thread-safe (`Send + Sync`). Transitions on the
/// same key id are serialized; reads are not.
#[async_trait]
pub trait KeyManagementApi: Send + Sync {
    // =========================================================================
    // CRUD
    // =========================================================================

    /// Store a key pair as a new `active` key. The id is the pair's explicit
    /// key id or the one derived from its public key.
    async fn store(
        &self,
        key_pair: KeyPair,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError>;

    /// Generate a fresh key on `curve` and store it.
    async fn generate_key(
        &self,
        curve: Curve,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError>;

    /// Full record by id.
    async fn retrieve(&self, key_id: &str) -> Result<KeyRecord, KeyManagerError>;

    /// Public half by id, in any status.
    async fn retrieve_public_key(&self, key_id: &str) -> Result<PublicKeyInfo, KeyManagerError>;

    /// Summaries matching `filter`, oldest first.
    async fn list(&self, filter: &KeyFilter) -> Result<Vec<KeySummary>, KeyManagerError>;

    /// Remove a key.
    async fn delete(&self, key_id: &str) -> Result<(), KeyManagerError>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark `old_key_id` as `rotating` and store `new_key_pair` as `active`,
    /// atomically.
    async fn rotate(
        &self,
        old_key_id: &str,
        new_key_pair: KeyPair,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError>;

    /// Force a key to `revoked`.
    async fn revoke(&self, key_id: &str, reason: &str) -> Result<KeySummary, KeyManagerError>;

    /// Expire keys past their lifetime and report those due for rotation.
    async fn sweep(&self) -> Result<SweepReport, KeyManagerError>;

    // =========================================================================
    // Key Selection
    // =========================================================================

    /// Newest signing-eligible `active` key, optionally restricted to a curve.
    async fn active_signing_key(&self, curve: Option<Curve>)
        -> Result<KeyRecord, KeyManagerError>;

    /// Public key for verifying already-issued tokens. Active, rotating and
    /// expired keys qualify; revoked keys do not.
    async fn verification_key(&self, key_id: &str) -> Result<PublicKeyInfo, KeyManagerError>;

    /// Counts per status.
    async fn statistics(&self) -> Result<KeyStatistics, KeyManagerError>;
}
