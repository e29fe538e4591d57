//! Key Manager Adapter
//!
//! Implements the `SigningKeyProvider` port on top of the key management
//! subsystem (VT-02).

use crate::ports::outbound::{
    KeyProviderError, SigningKeyProvider, SigningMaterial, VerificationMaterial,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use vt_02_key_management::{KeyManagementApi, KeyManagerError};
use vt_crypto::Curve;

/// Resolves keys through a [`KeyManagementApi`].
pub struct KeyManagerProvider<K: KeyManagementApi> {
    manager: Arc<K>,
}

impl<K: KeyManagementApi> KeyManagerProvider<K> {
    pub fn new(manager: Arc<K>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<K> {
        &self.manager
    }
}

impl<K: KeyManagementApi> Clone for KeyManagerProvider<K> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

fn map_error(err: KeyManagerError) -> KeyProviderError {
    match err {
        KeyManagerError::KeyNotFound(id) => KeyProviderError::NotFound(id),
        KeyManagerError::NoActiveKey(curve) => KeyProviderError::NotFound(
            curve.map_or_else(|| "active key".to_string(), |c| format!("active {c} key")),
        ),
        KeyManagerError::KeyRevoked(id) => KeyProviderError::Revoked(id),
        other => KeyProviderError::Unavailable {
            code: other.code(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl<K: KeyManagementApi> SigningKeyProvider for KeyManagerProvider<K> {
    async fn signing_key(&self, curve: Curve) -> Result<SigningMaterial, KeyProviderError> {
        let record = self
            .manager
            .active_signing_key(Some(curve))
            .await
            .map_err(map_error)?;
        debug!("[vt-01] Resolved signing key {}", record.key_id);
        Ok(SigningMaterial {
            key_id: record.key_id.clone(),
            curve: record.curve,
            private_key: record.private_key.clone(),
        })
    }

    async fn verification_key(
        &self,
        key_id: &str,
    ) -> Result<VerificationMaterial, KeyProviderError> {
        let info = self
            .manager
            .verification_key(key_id)
            .await
            .map_err(map_error)?;
        Ok(VerificationMaterial {
            key_id: info.key_id,
            curve: info.curve,
            public_key: info.public_key,
        })
    }
}
