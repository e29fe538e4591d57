//! # Token Lifecycle Flows
//!
//! Issue → verify → expire, with the claims sourced from the code generator
//! and the verification key exchanged as PEM.
//!
//! ```text
//! [CodeGenerator] ──batch code──→ [TokenService (issuer)] ──token──→ [TokenService (verifier)]
//!                                        │                                   ↑
//!                                   private key                       PEM public key
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::fixtures::{TokenHarness, AUDIENCE, EPOCH, ISSUER};
    use vt_01_redemption_tokens::{
        TokenApi, TokenError, TokenService, TokenServiceConfig, ValidationFailure, VoucherClaims,
    };
    use vt_crypto::{parse_batch_code, BatchCodeOptions, CodeGenerator, Curve, EcdsaEngine, SecureRandom};
    use vt_shared_types::{AuditEventType, ErrorCode, ManualClock};
    use vt_telemetry::TracingAuditLogger;

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    /// P-256 user voucher: valid for its TTL, hard-expired afterwards.
    #[test]
    fn test_user_voucher_end_to_end() {
        let harness = TokenHarness::new("ES256");
        let claims = VoucherClaims::user("v-1", "u-1");
        let token = harness.issue(&claims, Some(300));

        let result = harness
            .service
            .verify_token(&token, harness.key_pair.public_key())
            .unwrap();
        assert!(result.is_valid);
        let payload = result.payload.unwrap();
        assert_eq!(payload.vid(), "v-1");
        assert_eq!(payload.iss, ISSUER);
        assert_eq!(payload.aud, AUDIENCE);
        assert_eq!(payload.exp, Some(EPOCH + 300));

        harness.clock.advance_secs(299);
        assert!(harness
            .service
            .verify_token(&token, harness.key_pair.public_key())
            .unwrap()
            .is_valid);

        harness.clock.advance_secs(1);
        let err = harness
            .service
            .verify_token(&token, harness.key_pair.public_key())
            .unwrap_err();
        assert_eq!(err, TokenError::TokenExpired { exp: EPOCH + 300 });
        assert_eq!(err.code(), ErrorCode::TokenExpired);

        assert_eq!(harness.audit.events_of(AuditEventType::TokenGenerated).len(), 1);
        assert_eq!(harness.audit.events_of(AuditEventType::TokenVerified).len(), 2);
        assert_eq!(harness.audit.events_of(AuditEventType::TokenRejected).len(), 1);
    }

    /// Print voucher carrying a generated batch code and redemption limit.
    #[test]
    fn test_print_voucher_with_generated_batch_code() {
        let harness = TokenHarness::new("ES384");
        let codes = CodeGenerator::new(SecureRandom::new());
        let batch = codes
            .batch_code(&BatchCodeOptions {
                prefix: "PIKA".into(),
                year: Some(2026),
                month: Some(10),
                sequence_length: 4,
            })
            .unwrap();

        let claims = VoucherClaims::print("v-print-9", batch.clone(), Some(250)).with_provider("prov-3");
        let token = harness.issue(&claims, Some(86_400));
        let result = harness
            .service
            .verify_token(&token, harness.key_pair.public_key())
            .unwrap();
        assert!(result.is_valid);

        let payload = result.payload.unwrap();
        assert_eq!(payload.claims, claims);
        assert_eq!(payload.claims.lmt(), Some(250));
        assert_eq!(payload.claims.pid(), Some("prov-3"));

        let VoucherClaims::Print { btc, .. } = payload.claims else {
            panic!("print claims expected");
        };
        let parsed = parse_batch_code(&btc).unwrap();
        assert_eq!((parsed.prefix.as_str(), parsed.year, parsed.month), ("PIKA", 2026, 10));
        assert_eq!(parsed.format(), batch);
    }

    /// Issuer holds the private key; verifier only ever sees the PEM public key.
    #[test]
    fn test_pem_key_exchange_between_services() {
        for curve in Curve::ALL {
            let issuer = TokenHarness::new(curve.algorithm());
            let engine = EcdsaEngine::new(curve);
            let pem = engine.export_public_key(issuer.key_pair.public_key()).unwrap();
            assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));

            let verifier = TokenService::new(TokenServiceConfig::new(curve.algorithm(), ISSUER, AUDIENCE))
                .unwrap()
                .with_clock(issuer.clock.clone());
            let public_key = engine.import_public_key(&pem).unwrap();
            let token = issuer.issue(&VoucherClaims::user("v-pem", "u-pem"), Some(60));

            let result = verifier.verify_token(&token, &public_key).unwrap();
            assert!(result.is_valid, "{curve}");
        }
    }

    /// Tokens without a TTL never expire.
    #[test]
    fn test_unbounded_token_survives_clock_jumps() {
        let harness = TokenHarness::new("ES256K");
        let token = harness.issue(&VoucherClaims::user("v-2", "u-2"), None);
        harness.clock.advance_secs(20 * 365 * 86_400);
        assert!(harness
            .service
            .verify_token(&token, harness.key_pair.public_key())
            .unwrap()
            .is_valid);
    }

    /// A verifier with a different audience rejects without raising.
    #[test]
    fn test_audience_isolation() {
        let issuer = TokenHarness::new("ES256");
        let other = TokenService::new(TokenServiceConfig::new("ES256", ISSUER, "partner-portal"))
            .unwrap()
            .with_clock(issuer.clock.clone());
        let token = issuer.issue(&VoucherClaims::user("v-3", "u-3"), Some(60));
        let result = other.verify_token(&token, issuer.key_pair.public_key()).unwrap();
        assert_eq!(result.error, Some(ValidationFailure::AudienceMismatch));
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    /// One service shared by many tasks issues distinct, valid tokens.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issuance_and_batch_verification() {
        let harness = TokenHarness::new("ES256");
        let private_key = Arc::new(harness.key_pair.private_key().clone());

        let mut handles = Vec::new();
        for i in 0..32 {
            let service = harness.service.clone();
            let private_key = private_key.clone();
            handles.push(tokio::spawn(async move {
                service
                    .generate_token(
                        &VoucherClaims::user(format!("v-{i}"), format!("u-{i}")),
                        private_key.as_bytes(),
                        Some(600),
                    )
                    .unwrap()
            }));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap());
        }
        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let batch = harness.service.batch_verify(&refs, harness.key_pair.public_key());
        assert!(batch.all_valid());
        assert_eq!(batch.valid_count, 32);

        let mut jtis: Vec<String> = batch
            .results
            .into_iter()
            .map(|r| r.unwrap().payload.unwrap().jti)
            .collect();
        jtis.sort();
        jtis.dedup();
        assert_eq!(jtis.len(), 32);
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    /// The tracing-backed audit sink accepts every event the service emits.
    #[test]
    fn test_tracing_audit_sink_wiring() {
        let clock = Arc::new(ManualClock::at_unix(EPOCH));
        let service = TokenService::new(TokenServiceConfig::default())
            .unwrap()
            .with_clock(clock)
            .with_audit_logger(Arc::new(TracingAuditLogger::with_service_name("vt-tests")));
        let pair = EcdsaEngine::new(Curve::P256).generate_key_pair().unwrap();

        let token = service
            .generate_token(&VoucherClaims::user("v-4", "u-4"), pair.private_key().as_bytes(), Some(60))
            .unwrap();
        assert!(service.verify_token(&token, pair.public_key()).unwrap().is_valid);
        assert!(service.verify_token("not-a-token", pair.public_key()).is_err());
    }
}
