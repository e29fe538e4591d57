//! # Outbound Ports (Driven Ports / SPI)
//!
//! The key-value store holding [`KeyRecord`]s. This subsystem never opens a
//! database itself; a backend is injected into the key manager.

use crate::domain::entities::{KeyFilter, KeyRecord, PublicKeyInfo};
use crate::domain::errors::StorageError;
use async_trait::async_trait;

/// Key record storage.
///
/// Implementations must make [`rotate`](KeyStorage::rotate) atomic: either
/// both writes are visible or neither is.
#[async_trait]
pub trait KeyStorage: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    /// * `StorageError::AlreadyExists` - a record with this id exists
    async fn store(&self, record: KeyRecord) -> Result<(), StorageError>;

    /// Full record, including private material.
    async fn retrieve(&self, key_id: &str) -> Result<Option<KeyRecord>, StorageError>;

    /// Public half only.
    async fn retrieve_public_key(&self, key_id: &str)
        -> Result<Option<PublicKeyInfo>, StorageError>;

    /// Records matching the filter, in no particular order.
    async fn list(&self, filter: &KeyFilter) -> Result<Vec<KeyRecord>, StorageError>;

    /// Replace an existing record.
    ///
    /// # Errors
    /// * `StorageError::NotFound` - no record with this id
    async fn update(&self, record: KeyRecord) -> Result<(), StorageError>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, key_id: &str) -> Result<bool, StorageError>;

    /// Replace `previous` and insert `successor` as one atomic step.
    ///
    /// # Errors
    /// * `StorageError::NotFound` - `previous` does not exist
    /// * `StorageError::AlreadyExists` - `successor` id is taken
    async fn rotate(&self, previous: KeyRecord, successor: KeyRecord) -> Result<(), StorageError>;
}
