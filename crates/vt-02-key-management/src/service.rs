//! # Key Manager Service
//!
//! Application service implementing [`KeyManagementApi`] on top of an
//! injected [`KeyStorage`].
//!
//! ## Concurrency
//!
//! Every transition (`store`, `rotate`, `delete`, `revoke`, sweep expiry)
//! holds a per-key `tokio::sync::Mutex`. Rotation takes both locks in sorted
//! id order, so a rotation cannot interleave with a delete of either key.
//! Reads go straight to storage.
//!
//! ## Audit
//!
//! Each transition emits one [`SecurityAuditEvent`] to the injected
//! [`AuditLogger`]; the default logger drops events.

use crate::config::KeyRotationPolicy;
use crate::domain::entities::{
    KeyFilter, KeyMetadata, KeyRecord, KeyStatistics, KeyStatus, KeySummary, PublicKeyInfo,
    SweepReport,
};
use crate::domain::errors::{KeyManagerError, StorageError};
use crate::domain::lifecycle::{self, LifecycleAction};
use crate::ports::inbound::KeyManagementApi;
use crate::ports::outbound::KeyStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use vt_crypto::{Curve, EcdsaEngine, KeyPair};
use vt_shared_types::{
    AuditEventType, AuditLogger, AuditSeverity, Clock, KeyOperationDetails, NoopAuditLogger,
    SecurityAuditEvent, SystemClock,
};
use vt_telemetry::{log_event, log_key_event};

const SUBSYSTEM: &str = "vt-02";

type LockMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Held transition lock for one key id.
///
/// The map entry is removed on drop once no other task holds or waits on it,
/// so the map only tracks ids with a transition in flight.
struct KeyLockGuard<'a> {
    locks: &'a LockMap,
    key_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock();
        if locks
            .get(&self.key_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key_id);
        }
    }
}

/// Key Manager.
///
/// Owns the mapping from key id to [`KeyRecord`] and enforces the
/// [`KeyRotationPolicy`].
pub struct KeyManager<S: KeyStorage> {
    storage: S,
    policy: KeyRotationPolicy,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
    locks: LockMap,
}

impl<S: KeyStorage> KeyManager<S> {
    /// Create a key manager with the system clock and no audit sink.
    ///
    /// # Errors
    /// * `KeyManagerError::InvalidPolicy` - the policy fails validation
    pub fn new(storage: S, policy: KeyRotationPolicy) -> Result<Self, KeyManagerError> {
        policy.validate().map_err(KeyManagerError::InvalidPolicy)?;
        Ok(Self {
            storage,
            policy,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoopAuditLogger),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &KeyRotationPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn lock_key(&self, key_id: &str) -> KeyLockGuard<'_> {
        let lock = self
            .locks
            .lock()
            .entry(key_id.to_string())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;
        KeyLockGuard {
            locks: &self.locks,
            key_id: key_id.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().len()
    }

    fn emit(
        &self,
        event_type: AuditEventType,
        key_id: &str,
        details: KeyOperationDetails,
        severity: AuditSeverity,
    ) {
        self.audit.log(SecurityAuditEvent::key(
            self.clock.now(),
            event_type,
            key_id,
            details,
            severity,
        ));
    }

    fn new_record(&self, key_pair: KeyPair, metadata: KeyMetadata, now: DateTime<Utc>) -> KeyRecord {
        KeyRecord {
            key_id: key_pair.resolved_key_id(),
            curve: key_pair.curve(),
            public_key: key_pair.public_key().to_vec(),
            private_key: key_pair.private_key().clone(),
            status: KeyStatus::Active,
            created_at: now,
            activated_at: Some(now),
            expires_at: Some(lifecycle::hard_expiry(now, &self.policy)),
            rotate_at: Some(lifecycle::rotate_at(now, &self.policy)),
            metadata,
        }
    }

    async fn load(&self, key_id: &str) -> Result<KeyRecord, KeyManagerError> {
        self.storage
            .retrieve(key_id)
            .await?
            .ok_or_else(|| KeyManagerError::KeyNotFound(key_id.to_string()))
    }

    /// Apply a status change to a record the caller has locked.
    async fn transition(
        &self,
        mut record: KeyRecord,
        to: KeyStatus,
    ) -> Result<KeyRecord, KeyManagerError> {
        if !lifecycle::can_transition(record.status, to) {
            return Err(KeyManagerError::InvalidTransition {
                key_id: record.key_id,
                from: record.status,
                to,
            });
        }
        record.status = to;
        self.storage.update(record.clone()).await?;
        Ok(record)
    }

    /// Expire one record if it is still due, under its lock.
    async fn expire_if_due(&self, key_id: &str) -> Result<bool, KeyManagerError> {
        let _guard = self.lock_key(key_id).await;

        // Re-read: the record may have changed since the sweep listed it
        let Some(record) = self.storage.retrieve(key_id).await? else {
            return Ok(false);
        };
        let now = self.clock.now();
        if lifecycle::evaluate(&record, now) != LifecycleAction::Expire {
            return Ok(false);
        }

        let previous = record.status;
        let record = self.transition(record, KeyStatus::Expired).await?;
        log_key_event!(info, SUBSYSTEM, "expire", record.key_id, "[vt-02] key expired");

        let mut details = KeyOperationDetails::new("expire");
        details.curve = Some(record.curve.to_string());
        details.previous_status = Some(previous.to_string());
        details.new_status = Some(KeyStatus::Expired.to_string());
        details.reason = Some("lifetime exceeded".to_string());
        self.emit(
            AuditEventType::KeyExpired,
            &record.key_id,
            details,
            AuditSeverity::Info,
        );
        Ok(true)
    }
}

#[async_trait]
impl<S: KeyStorage> KeyManagementApi for KeyManager<S> {
    async fn store(
        &self,
        key_pair: KeyPair,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError> {
        let key_id = key_pair.resolved_key_id();
        let _guard = self.lock_key(&key_id).await;

        let record = self.new_record(key_pair, metadata, self.clock.now());
        let summary = record.summary();
        self.storage.store(record).await?;

        log_key_event!(
            info,
            SUBSYSTEM,
            "store",
            summary.key_id,
            "[vt-02] key stored",
            curve = %summary.curve
        );
        let mut details = KeyOperationDetails::new("store");
        details.curve = Some(summary.curve.to_string());
        details.new_status = Some(KeyStatus::Active.to_string());
        self.emit(
            AuditEventType::KeyStored,
            &summary.key_id,
            details,
            AuditSeverity::Info,
        );
        Ok(summary)
    }

    async fn generate_key(
        &self,
        curve: Curve,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError> {
        let key_pair = EcdsaEngine::new(curve).generate_key_pair()?;
        let key_id = key_pair.resolved_key_id();

        let mut details = KeyOperationDetails::new("generate");
        details.curve = Some(curve.to_string());
        self.emit(
            AuditEventType::KeyGenerated,
            &key_id,
            details,
            AuditSeverity::Info,
        );

        self.store(key_pair, metadata).await
    }

    async fn retrieve(&self, key_id: &str) -> Result<KeyRecord, KeyManagerError> {
        self.load(key_id).await
    }

    async fn retrieve_public_key(&self, key_id: &str) -> Result<PublicKeyInfo, KeyManagerError> {
        self.storage
            .retrieve_public_key(key_id)
            .await?
            .ok_or_else(|| KeyManagerError::KeyNotFound(key_id.to_string()))
    }

    async fn list(&self, filter: &KeyFilter) -> Result<Vec<KeySummary>, KeyManagerError> {
        let mut records = self.storage.list(filter).await?;
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key_id.cmp(&b.key_id))
        });
        Ok(records.iter().map(KeyRecord::summary).collect())
    }

    async fn delete(&self, key_id: &str) -> Result<(), KeyManagerError> {
        let _guard = self.lock_key(key_id).await;

        let record = self.load(key_id).await?;
        if !self.storage.delete(key_id).await? {
            return Err(KeyManagerError::KeyNotFound(key_id.to_string()));
        }

        log_key_event!(
            warn,
            SUBSYSTEM,
            "delete",
            key_id,
            "[vt-02] key deleted",
            status = %record.status
        );
        let mut details = KeyOperationDetails::new("delete");
        details.curve = Some(record.curve.to_string());
        details.previous_status = Some(record.status.to_string());
        self.emit(
            AuditEventType::KeyDeleted,
            key_id,
            details,
            AuditSeverity::Warning,
        );
        Ok(())
    }

    async fn rotate(
        &self,
        old_key_id: &str,
        new_key_pair: KeyPair,
        metadata: KeyMetadata,
    ) -> Result<KeySummary, KeyManagerError> {
        let new_key_id = new_key_pair.resolved_key_id();
        if new_key_id == old_key_id {
            return Err(KeyManagerError::RotationFailed(
                "successor must have a different key id".to_string(),
            ));
        }

        // Sorted acquisition order prevents deadlock between opposite rotations
        let (first, second) = if old_key_id < new_key_id.as_str() {
            (old_key_id, new_key_id.as_str())
        } else {
            (new_key_id.as_str(), old_key_id)
        };
        let _first = self.lock_key(first).await;
        let _second = self.lock_key(second).await;

        let mut previous = self.load(old_key_id).await?;
        if previous.status != KeyStatus::Active {
            return Err(KeyManagerError::InvalidTransition {
                key_id: previous.key_id,
                from: previous.status,
                to: KeyStatus::Rotating,
            });
        }
        if previous.curve != new_key_pair.curve() {
            return Err(KeyManagerError::CurveMismatch {
                expected: previous.curve,
                actual: new_key_pair.curve(),
            });
        }

        let now = self.clock.now();
        previous.expires_at = Some(lifecycle::rotation_expiry(&previous, now, &self.policy));
        previous.status = KeyStatus::Rotating;
        let successor = self.new_record(new_key_pair, metadata, now);
        let summary = successor.summary();
        let curve = previous.curve;

        self.storage
            .rotate(previous, successor)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists(id) => KeyManagerError::KeyExists(id),
                other => KeyManagerError::RotationFailed(other.to_string()),
            })?;

        log_key_event!(
            info,
            SUBSYSTEM,
            "rotate",
            old_key_id,
            "[vt-02] key rotated",
            successor = %summary.key_id
        );
        let mut details = KeyOperationDetails::new("rotate");
        details.curve = Some(curve.to_string());
        details.previous_status = Some(KeyStatus::Active.to_string());
        details.new_status = Some(KeyStatus::Rotating.to_string());
        details.successor_key_id = Some(summary.key_id.clone());
        self.emit(
            AuditEventType::KeyRotation,
            old_key_id,
            details,
            AuditSeverity::Info,
        );
        Ok(summary)
    }

    async fn revoke(&self, key_id: &str, reason: &str) -> Result<KeySummary, KeyManagerError> {
        let _guard = self.lock_key(key_id).await;

        let record = self.load(key_id).await?;
        let previous = record.status;
        let record = self.transition(record, KeyStatus::Revoked).await?;

        log_key_event!(
            warn,
            SUBSYSTEM,
            "revoke",
            key_id,
            "[vt-02] key revoked",
            reason = %reason
        );
        let mut details = KeyOperationDetails::new("revoke");
        details.curve = Some(record.curve.to_string());
        details.previous_status = Some(previous.to_string());
        details.new_status = Some(KeyStatus::Revoked.to_string());
        details.reason = Some(reason.to_string());
        self.emit(
            AuditEventType::KeyRevoked,
            key_id,
            details,
            AuditSeverity::Critical,
        );
        Ok(record.summary())
    }

    async fn sweep(&self) -> Result<SweepReport, KeyManagerError> {
        let now = self.clock.now();
        let mut candidates = self.storage.list(&KeyFilter::all()).await?;
        candidates.sort_by(|a, b| a.key_id.cmp(&b.key_id));

        let mut report = SweepReport::default();
        for record in candidates {
            match lifecycle::evaluate(&record, now) {
                LifecycleAction::Keep => {}
                LifecycleAction::DueForRotation => report.due_for_rotation.push(record.key_id),
                LifecycleAction::Expire => {
                    if self.expire_if_due(&record.key_id).await? {
                        report.expired.push(record.key_id);
                    }
                }
            }
        }

        log_event!(
            debug,
            SUBSYSTEM,
            "[vt-02] sweep complete",
            expired = report.expired.len(),
            due_for_rotation = report.due_for_rotation.len()
        );
        Ok(report)
    }

    async fn active_signing_key(
        &self,
        curve: Option<Curve>,
    ) -> Result<KeyRecord, KeyManagerError> {
        let mut filter = KeyFilter::all().with_status(KeyStatus::Active);
        filter.curve = curve;
        let now = self.clock.now();

        self.storage
            .list(&filter)
            .await?
            .into_iter()
            .filter(|r| lifecycle::is_signing_eligible(r, now))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.key_id.cmp(&b.key_id))
            })
            .ok_or(KeyManagerError::NoActiveKey(curve))
    }

    async fn verification_key(&self, key_id: &str) -> Result<PublicKeyInfo, KeyManagerError> {
        let info = self.retrieve_public_key(key_id).await?;
        if !info.status.can_verify() {
            return Err(KeyManagerError::KeyRevoked(key_id.to_string()));
        }
        Ok(info)
    }

    async fn statistics(&self) -> Result<KeyStatistics, KeyManagerError> {
        let records = self.storage.list(&KeyFilter::all()).await?;
        Ok(KeyStatistics::from_statuses(records.iter().map(|r| r.status)))
    }
}
