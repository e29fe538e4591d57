//! # Key Misuse
//!
//! Attacks on key resolution: presenting a token under a key of another
//! curve, forging the `kid`, replaying tokens of a revoked key, and fishing
//! for private material in logs and audit records.

#[cfg(test)]
mod tests {
    use crate::fixtures::{header_segment, key_pair, replace_segment, KeyHarness, TokenHarness};
    use vt_01_redemption_tokens::{TokenApi, TokenOptions, ValidationFailure, VoucherClaims};
    use vt_02_key_management::{KeyManagementApi, KeyMetadata};
    use vt_crypto::Curve;
    use vt_shared_types::{ErrorCode, ViolationKind};

    const HOUR: u64 = 3600;

    fn claims() -> VoucherClaims {
        VoucherClaims::user("v-key", "u-secret-identity")
    }

    /// Cross-curve public keys never verify, whatever their byte length.
    #[test]
    fn test_cross_curve_public_keys() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        for curve in [Curve::P384, Curve::P521, Curve::Secp256k1] {
            let foreign = key_pair(curve);
            let result = harness
                .service
                .verify_token(&token, foreign.public_key())
                .unwrap();
            assert!(!result.is_valid, "{curve}");
        }
    }

    /// `kid` pointing at a stored key of another curve.
    #[tokio::test]
    async fn test_kid_pointing_at_foreign_curve_key() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, HOUR);
        let p384 = keys
            .manager
            .generate_key(Curve::P384, KeyMetadata::new())
            .await
            .unwrap();

        let token = tokens
            .service
            .generate_token_with(
                &claims(),
                tokens.key_pair.private_key().as_bytes(),
                TokenOptions {
                    ttl_secs: Some(300),
                    key_id: Some(p384.key_id.clone()),
                    ..TokenOptions::default()
                },
            )
            .unwrap();

        let result = tokens
            .service
            .verify_with_key_provider(&token, &keys.provider)
            .await
            .unwrap();
        assert_eq!(result.error_code(), Some(ErrorCode::CurveMismatch));
        assert_eq!(tokens.violations(), vec![ViolationKind::CurveMismatch]);
    }

    /// Rewriting `kid` to another stored key breaks the signature.
    #[tokio::test]
    async fn test_forged_kid() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, HOUR);
        let victim = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();

        let own = tokens.issue(&claims(), Some(300));
        let header = header_segment(&format!(
            r#"{{"alg":"ES256","typ":"JWT","kid":"{}"}}"#,
            victim.key_id
        ));
        let forged = replace_segment(&own, 0, &header);

        let result = tokens
            .service
            .verify_with_key_provider(&forged, &keys.provider)
            .await
            .unwrap();
        assert_eq!(result.error, Some(ValidationFailure::InvalidSignature));

        let unknown = replace_segment(&own, 0, &header_segment(r#"{"alg":"ES256","typ":"JWT","kid":"../../etc/passwd"}"#));
        let result = tokens
            .service
            .verify_with_key_provider(&unknown, &keys.provider)
            .await
            .unwrap();
        assert_eq!(result.error_code(), Some(ErrorCode::KeyNotFound));
    }

    /// Replaying tokens of a revoked key, even unexpired ones.
    #[tokio::test]
    async fn test_revoked_key_replay() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, HOUR);
        let key = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();

        let replayed: Vec<String> = {
            let mut issued = Vec::new();
            for _ in 0..3 {
                issued.push(
                    tokens
                        .service
                        .issue_with_key_provider(&keys.provider, &claims(), Some(3600))
                        .await
                        .unwrap(),
                );
            }
            issued
        };
        keys.manager.revoke(&key.key_id, "incident").await.unwrap();

        for token in &replayed {
            let result = tokens
                .service
                .verify_with_key_provider(token, &keys.provider)
                .await
                .unwrap();
            assert_eq!(result.error_code(), Some(ErrorCode::InvalidKey));
        }
        assert_eq!(tokens.violations(), vec![ViolationKind::RevokedKeyUse; 3]);
    }

    /// Private scalars and user ids never show up in `Debug` output or audit records.
    #[tokio::test]
    async fn test_no_secret_leakage() {
        let tokens = TokenHarness::new("ES256");
        let keys = KeyHarness::new(tokens.clock.clone(), HOUR, HOUR);
        let summary = keys
            .manager
            .generate_key(Curve::P256, KeyMetadata::new())
            .await
            .unwrap();
        let record = keys.manager.retrieve(&summary.key_id).await.unwrap();
        let secret_hex = hex_lower(record.private_key.as_bytes());

        assert!(!format!("{record:?}").contains(&secret_hex));
        assert!(!format!("{:?}", tokens.key_pair).contains(&hex_lower(tokens.key_pair.private_key().as_bytes())));
        assert!(!serde_json::to_string(&summary).unwrap().contains(&secret_hex));

        let token = tokens
            .service
            .issue_with_key_provider(&keys.provider, &claims(), Some(60))
            .await
            .unwrap();
        tokens
            .service
            .verify_with_key_provider(&token, &keys.provider)
            .await
            .unwrap();

        let mut audit = serde_json::to_string(&tokens.audit.events()).unwrap();
        audit.push_str(&serde_json::to_string(&keys.audit.events()).unwrap());
        assert!(!audit.contains(&secret_hex));
        assert!(!audit.contains("u-secret-identity"));
        assert!(!audit.contains(&token));
        assert!(audit.contains("v-key"));
    }

    fn hex_lower(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
