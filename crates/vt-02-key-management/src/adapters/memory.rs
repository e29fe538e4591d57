//! In-Memory Key Storage Adapter
//!
//! Implements the `KeyStorage` port over a `HashMap`. Suitable for tests and
//! single-process deployments; records are lost on restart.

use crate::domain::entities::{KeyFilter, KeyRecord, PublicKeyInfo};
use crate::domain::errors::StorageError;
use crate::ports::outbound::KeyStorage;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// `HashMap`-backed key storage.
#[derive(Default)]
pub struct InMemoryKeyStorage {
    records: RwLock<HashMap<String, KeyRecord>>,
}

impl InMemoryKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl KeyStorage for InMemoryKeyStorage {
    async fn store(&self, record: KeyRecord) -> Result<(), StorageError> {
        let mut records = self.records.write();
        if records.contains_key(&record.key_id) {
            return Err(StorageError::AlreadyExists(record.key_id));
        }
        debug!("[vt-02] Storing key {}", record.key_id);
        records.insert(record.key_id.clone(), record);
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> Result<Option<KeyRecord>, StorageError> {
        Ok(self.records.read().get(key_id).cloned())
    }

    async fn retrieve_public_key(
        &self,
        key_id: &str,
    ) -> Result<Option<PublicKeyInfo>, StorageError> {
        Ok(self.records.read().get(key_id).map(KeyRecord::public_key_info))
    }

    async fn list(&self, filter: &KeyFilter) -> Result<Vec<KeyRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update(&self, record: KeyRecord) -> Result<(), StorageError> {
        let mut records = self.records.write();
        match records.get_mut(&record.key_id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StorageError::NotFound(record.key_id)),
        }
    }

    async fn delete(&self, key_id: &str) -> Result<bool, StorageError> {
        debug!("[vt-02] Deleting key {}", key_id);
        Ok(self.records.write().remove(key_id).is_some())
    }

    async fn rotate(&self, previous: KeyRecord, successor: KeyRecord) -> Result<(), StorageError> {
        let mut records = self.records.write();
        if !records.contains_key(&previous.key_id) {
            return Err(StorageError::NotFound(previous.key_id));
        }
        if records.contains_key(&successor.key_id) {
            return Err(StorageError::AlreadyExists(successor.key_id));
        }
        debug!(
            "[vt-02] Rotating key {} -> {}",
            previous.key_id, successor.key_id
        );
        records.insert(previous.key_id.clone(), previous);
        records.insert(successor.key_id.clone(), successor);
        Ok(())
    }
}
