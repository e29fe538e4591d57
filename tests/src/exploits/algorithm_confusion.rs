//! # Algorithm Confusion
//!
//! Attacker rewrites the header `alg` and hopes the verifier follows it:
//! `none` to skip the signature, `HS256` to treat the public key as an HMAC
//! secret, or another ECDSA curve the attacker holds a key for.

#[cfg(test)]
mod tests {
    use crate::fixtures::{header_segment, replace_segment, TokenHarness, AUDIENCE, ISSUER};
    use rand::RngCore;
    use vt_01_redemption_tokens::domain::encoding::{encode_segment, signing_input};
    use vt_01_redemption_tokens::{
        TokenApi, TokenError, TokenService, TokenServiceConfig, ValidationFailure, VoucherClaims,
    };
    use vt_crypto::{Curve, EcdsaEngine};
    use vt_shared_types::{ErrorCode, ViolationKind};

    fn claims() -> VoucherClaims {
        VoucherClaims::user("v-alg", "u-alg")
    }

    /// `alg: none` with the original signature still attached.
    #[test]
    fn test_alg_none_keeps_signature() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let forged = replace_segment(&token, 0, &header_segment(r#"{"alg":"none","typ":"JWT"}"#));

        let result = harness
            .service
            .verify_token(&forged, harness.key_pair.public_key())
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.error_code(), Some(ErrorCode::AlgorithmMismatch));
        assert_eq!(harness.violations(), vec![ViolationKind::AlgorithmConfusion]);
    }

    /// `alg: none` with the signature stripped is not even a token.
    #[test]
    fn test_alg_none_unsigned() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let (input, _) = token.rsplit_once('.').unwrap();
        let (_, payload) = input.split_once('.').unwrap();
        let unsigned = format!(
            "{}.{payload}.",
            header_segment(r#"{"alg":"none","typ":"JWT"}"#)
        );

        assert_eq!(
            harness.service.verify_token(&unsigned, harness.key_pair.public_key()),
            Err(TokenError::InvalidTokenFormat)
        );
        assert_eq!(harness.violations(), vec![ViolationKind::MalformedToken]);
    }

    /// `HS256` "signed" with the public key as the HMAC secret.
    #[test]
    fn test_hmac_substitution() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let payload = token.split('.').nth(1).unwrap();
        let header = header_segment(r#"{"alg":"HS256","typ":"JWT"}"#);

        let mut mac = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut mac);
        let forged = format!("{}.{}", signing_input(&header, payload), encode_segment(&mac));

        let result = harness
            .service
            .verify_token(&forged, harness.key_pair.public_key())
            .unwrap();
        assert_eq!(
            result.error,
            Some(ValidationFailure::AlgorithmMismatch {
                expected: "ES256".into(),
                actual: "HS256".into(),
            })
        );
    }

    /// A genuinely signed token under an attacker-held key on another curve.
    #[test]
    fn test_curve_substitution_with_valid_foreign_signature() {
        let victim = TokenHarness::new("ES256");
        let attacker = TokenHarness::new("ES256K");
        let token = attacker.issue(&claims(), Some(300));

        // secp256k1 and P-256 public keys are both 33 bytes compressed
        let result = victim
            .service
            .verify_token(&token, attacker.key_pair.public_key())
            .unwrap();
        assert_eq!(result.error_code(), Some(ErrorCode::AlgorithmMismatch));

        // Relabel the header; the signature no longer covers it
        let relabeled = replace_segment(&token, 0, &header_segment(r#"{"alg":"ES256","typ":"JWT"}"#));
        let result = victim
            .service
            .verify_token(&relabeled, attacker.key_pair.public_key())
            .unwrap();
        assert_eq!(result.error_code(), Some(ErrorCode::InvalidSignature));
    }

    /// Near-miss spellings are not normalized.
    #[test]
    fn test_alg_spelling_variants() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        for alg in ["es256", "ES256 ", " ES256", "ES-256", "ES256\u{0000}", ""] {
            let header = header_segment(&serde_json::json!({"alg": alg, "typ": "JWT"}).to_string());
            let result = harness
                .service
                .verify_token(&replace_segment(&token, 0, &header), harness.key_pair.public_key())
                .unwrap();
            assert_eq!(result.error_code(), Some(ErrorCode::AlgorithmMismatch), "{alg:?}");
        }
    }

    /// A header without `alg` fails to parse rather than defaulting.
    #[test]
    fn test_missing_alg() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let forged = replace_segment(&token, 0, &header_segment(r#"{"typ":"JWT","kid":"p256-x"}"#));
        assert!(matches!(
            harness.service.verify_token(&forged, harness.key_pair.public_key()),
            Err(TokenError::InvalidTokenHeader(_))
        ));
    }

    /// No configuration path leads to a symmetric verifier.
    #[test]
    fn test_symmetric_services_cannot_be_built() {
        for alg in ["HS256", "HS384", "HS512", "none", "RS256", "PS256", "EdDSA"] {
            let err = TokenService::new(TokenServiceConfig::new(alg, ISSUER, AUDIENCE))
                .err()
                .unwrap();
            assert_eq!(err.code(), ErrorCode::AlgorithmMismatch, "{alg}");
        }
        for curve in Curve::ALL {
            assert!(TokenService::new(TokenServiceConfig::new(curve.algorithm(), ISSUER, AUDIENCE)).is_ok());
            assert_eq!(EcdsaEngine::for_algorithm(curve.algorithm()).unwrap().curve(), curve);
        }
    }
}
