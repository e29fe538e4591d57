//! # Key Rotation Flows
//!
//! Token issuance and verification through the key manager while keys are
//! rotated, aged out and revoked.
//!
//! ```text
//! [KeyManager] ──active key──→ [TokenService.issue_with_key_provider]
//!      │                                      │
//!      └──────key by kid──→ [TokenService.verify_with_key_provider] ←── token
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{key_pair, KeyHarness, TokenHarness, AUDIENCE, EPOCH, ISSUER};
    use vt_01_redemption_tokens::{TokenApi, TokenServiceConfig, ValidationFailure, VoucherClaims};
    use vt_02_key_management::{KeyManagementApi, KeyMetadata, KeyStatus};
    use vt_crypto::Curve;
    use vt_shared_types::{AuditEventType, AuditSeverity, Clock, ErrorCode, ViolationKind};

    const HOUR: u64 = 3600;
    const OVERLAP: u64 = 600;

    fn claims() -> VoucherClaims {
        VoucherClaims::user("v-rot", "u-rot")
    }

    // =============================================================================
    // ROTATION WITH OVERLAP
    // =============================================================================

    /// Tokens signed before a rotation keep verifying through the overlap
    /// window and after the predecessor is swept to `expired`.
    #[tokio::test]
    async fn test_rotation_keeps_in_flight_tokens_valid() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, OVERLAP);
        let first = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();

        let before = tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), None)
            .await
            .unwrap();

        tokens.clock.advance_secs(1800);
        let successor = keys
            .manager
            .rotate(&first.key_id, key_pair(Curve::P256), KeyMetadata::new())
            .await
            .unwrap();
        assert_eq!(successor.status, KeyStatus::Active);
        assert_eq!(
            keys.manager.retrieve(&first.key_id).await.unwrap().status,
            KeyStatus::Rotating
        );

        let after = tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), None)
            .await
            .unwrap();
        let kid = tokens.service.decode_token(&after).unwrap().header.kid;
        assert_eq!(kid.as_deref(), Some(successor.key_id.as_str()));

        for token in [&before, &after] {
            let result = tokens
                .service
                .verify_with_key_provider(token, &keys.provider)
                .await
                .unwrap();
            assert!(result.is_valid);
        }

        tokens.clock.advance_secs(OVERLAP as i64);
        let report = keys.manager.sweep().await.unwrap();
        assert_eq!(report.expired, vec![first.key_id.clone()]);
        assert_eq!(
            keys.manager.retrieve(&first.key_id).await.unwrap().status,
            KeyStatus::Expired
        );

        let result = tokens
            .service
            .verify_with_key_provider(&before, &keys.provider)
            .await
            .unwrap();
        assert!(result.is_valid);

        let signing = keys.manager.active_signing_key(Some(Curve::P256)).await.unwrap();
        assert_eq!(signing.key_id, successor.key_id);
        assert_eq!(keys.audit.events_of(AuditEventType::KeyRotation).len(), 1);
    }

    // =============================================================================
    // AGE-BASED EXPIRY
    // =============================================================================

    /// An unrotated key is flagged at `max_age` and stops signing at
    /// `max_age + overlap`, even before the sweep runs.
    #[tokio::test]
    async fn test_unrotated_key_ages_out() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, OVERLAP);
        let key = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();

        tokens.clock.advance_secs(HOUR as i64);
        let report = keys.manager.sweep().await.unwrap();
        assert_eq!(report.due_for_rotation, vec![key.key_id.clone()]);
        assert!(report.expired.is_empty());
        assert!(tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(60))
            .await
            .is_ok());

        tokens.clock.advance_secs(OVERLAP as i64);
        let err = tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(60))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);

        let report = keys.manager.sweep().await.unwrap();
        assert_eq!(report.expired, vec![key.key_id]);
        let stats = keys.manager.statistics().await.unwrap();
        assert_eq!((stats.total, stats.active, stats.expired), (1, 0, 1));
        assert_eq!(tokens.clock.unix_now(), EPOCH + (HOUR + OVERLAP) as i64);
    }

    // =============================================================================
    // REVOCATION
    // =============================================================================

    /// Revocation cuts off verification immediately and is audited on both sides.
    #[tokio::test]
    async fn test_revocation_blocks_verification() {
        let tokens = TokenHarness::new("ES384");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, OVERLAP);
        let key = keys
            .manager
            .generate_key(Curve::P384, KeyMetadata::new())
            .await
            .unwrap();
        let token = tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(600))
            .await
            .unwrap();

        keys.manager.revoke(&key.key_id, "key material leaked").await.unwrap();

        let result = tokens
            .service
            .verify_with_key_provider(&token, &keys.provider)
            .await
            .unwrap();
        assert_eq!(
            result.error,
            Some(ValidationFailure::KeyRevoked {
                key_id: key.key_id.clone()
            })
        );
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidKey));
        assert_eq!(tokens.violations(), vec![ViolationKind::RevokedKeyUse]);

        let revoked = keys.audit.events_of(AuditEventType::KeyRevoked);
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked[0].severity, AuditSeverity::Critical);

        assert!(tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(600))
            .await
            .is_err());
    }

    // =============================================================================
    // MULTI-CURVE
    // =============================================================================

    /// Each service picks the active key of its own curve.
    #[tokio::test]
    async fn test_services_select_keys_by_curve() {
        let es256 = TokenHarness::new("ES256");
        let es384 = TokenHarness::with_config(TokenServiceConfig::new("ES384", ISSUER, AUDIENCE));
        let keys = KeyHarness::new(es256.clock.clone(), HOUR, OVERLAP);
        for curve in [Curve::P256, Curve::P384] {
            keys.manager.generate_key(curve, KeyMetadata::new()).await.unwrap();
        }

        let t256 = es256
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(60))
            .await
            .unwrap();
        let t384 = es384
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(60))
            .await
            .unwrap();

        let kid = |token: &str| es256.service.decode_token(token).unwrap().header.kid.unwrap();
        assert!(kid(&t256).starts_with("p256-"));
        assert!(kid(&t384).starts_with("p384-"));

        assert!(es256
            .service
            .verify_with_key_provider(&t256, &keys.provider)
            .await
            .unwrap()
            .is_valid);
        let crossed = es256
            .service
            .verify_with_key_provider(&t384, &keys.provider)
            .await
            .unwrap();
        assert_eq!(crossed.error_code(), Some(ErrorCode::AlgorithmMismatch));
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    /// Racing rotations of one key: exactly one wins, no orphaned active key.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_rotations_serialize() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, OVERLAP);
        let original = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = keys.manager.clone();
            let key_id = original.key_id.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .rotate(&key_id, key_pair(Curve::P256), KeyMetadata::new())
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);

        let stats = keys.manager.statistics().await.unwrap();
        assert_eq!((stats.total, stats.active, stats.rotating), (2, 1, 1));
    }
}
