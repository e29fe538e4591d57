//! # Signature Tampering
//!
//! Attacker holds a valid token and edits it: flips signature bits, swaps in
//! the high-S twin of the signature, smuggles a DER signature, splices
//! segments from other tokens or re-pads segments.

#[cfg(test)]
mod tests {
    use crate::fixtures::{replace_segment, TokenHarness};
    use vt_01_redemption_tokens::domain::encoding::{decode_segment, encode_segment};
    use vt_01_redemption_tokens::{TokenApi, TokenError, ValidationFailure, VoucherClaims};
    use vt_crypto::{Curve, EcdsaEngine, Signature};
    use vt_shared_types::ViolationKind;

    fn claims() -> VoucherClaims {
        VoucherClaims::user("v-sig", "u-sig")
    }

    fn signature_bytes(token: &str) -> Vec<u8> {
        decode_segment(token.rsplit('.').next().unwrap()).unwrap()
    }

    /// `n - s`, big-endian, same width.
    fn negate_mod_order(curve: Curve, s: &[u8]) -> Vec<u8> {
        let order = curve.params().order;
        let mut out = vec![0u8; order.len()];
        let mut borrow = 0i16;
        for i in (0..order.len()).rev() {
            let mut diff = order[i] as i16 - s[i] as i16 - borrow;
            borrow = if diff < 0 { 1 } else { 0 };
            if diff < 0 {
                diff += 256;
            }
            out[i] = diff as u8;
        }
        out
    }

    /// Every single-byte flip of the signature is rejected.
    #[test]
    fn test_every_signature_byte_flip_rejected() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let original = signature_bytes(&token);

        for i in 0..original.len() {
            let mut tampered = original.clone();
            tampered[i] ^= 0x01;
            let forged = replace_segment(&token, 2, &encode_segment(&tampered));
            let result = harness
                .service
                .verify_token(&forged, harness.key_pair.public_key())
                .unwrap();
            assert_eq!(result.error, Some(ValidationFailure::InvalidSignature), "byte {i}");
        }
        assert!(harness
            .violations()
            .iter()
            .all(|v| *v == ViolationKind::SignatureTampering));
    }

    /// `(r, n - s)` is a mathematically valid ECDSA signature; it is still rejected.
    #[test]
    fn test_high_s_twin_rejected() {
        for curve in Curve::ALL {
            let harness = TokenHarness::new(curve.algorithm());
            let token = harness.issue(&claims(), Some(300));
            let compact = signature_bytes(&token);
            let (r, s) = compact.split_at(curve.component_len());
            assert!(curve.is_low_s(s), "{curve}");

            let high_s = negate_mod_order(curve, s);
            assert!(!curve.is_low_s(&high_s), "{curve}");
            let twin = [r, high_s.as_slice()].concat();
            let forged = replace_segment(&token, 2, &encode_segment(&twin));

            let result = harness
                .service
                .verify_token(&forged, harness.key_pair.public_key())
                .unwrap();
            assert_eq!(result.error, Some(ValidationFailure::InvalidSignature), "{curve}");

            let (input, _) = token.rsplit_once('.').unwrap();
            let engine = EcdsaEngine::new(curve);
            assert!(engine.verify_compact(input.as_bytes(), &compact, harness.key_pair.public_key()));
            assert!(!engine.verify_compact(input.as_bytes(), &twin, harness.key_pair.public_key()));
        }
    }

    /// A DER signature in the third segment is not accepted.
    #[test]
    fn test_der_signature_smuggling() {
        let harness = TokenHarness::new("ES384");
        let token = harness.issue(&claims(), Some(300));
        let engine = EcdsaEngine::new(Curve::P384);
        let compact = Signature::from_compact(Curve::P384, &signature_bytes(&token)).unwrap();
        let der = engine.signature_to_der(&compact).unwrap();

        let forged = replace_segment(&token, 2, &encode_segment(&der));
        let result = harness
            .service
            .verify_token(&forged, harness.key_pair.public_key())
            .unwrap();
        assert_eq!(result.error, Some(ValidationFailure::InvalidSignature));
    }

    /// Truncated and extended signatures.
    #[test]
    fn test_signature_length_games() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let original = signature_bytes(&token);

        let mut extended = original.clone();
        extended.push(0);
        for bytes in [&original[..63], &extended[..], &[][..]] {
            let segment = encode_segment(bytes);
            let forged = replace_segment(&token, 2, &segment);
            let outcome = harness.service.verify_token(&forged, harness.key_pair.public_key());
            match outcome {
                Ok(result) => assert!(!result.is_valid),
                Err(err) => assert_eq!(err, TokenError::InvalidTokenFormat),
            }
        }
    }

    /// Payload of one token with the signature of another.
    #[test]
    fn test_segment_splicing() {
        let harness = TokenHarness::new("ES256");
        let cheap = harness.issue(&VoucherClaims::print("v-cheap", "B-1", Some(1)), Some(300));
        let valuable = harness.issue(&VoucherClaims::print("v-gold", "B-2", Some(10_000)), Some(300));

        let spliced = replace_segment(&valuable, 2, cheap.rsplit('.').next().unwrap());
        let result = harness
            .service
            .verify_token(&spliced, harness.key_pair.public_key())
            .unwrap();
        assert_eq!(result.error, Some(ValidationFailure::InvalidSignature));
    }

    /// Re-encoded payload claiming a higher redemption limit.
    #[test]
    fn test_payload_rewrite() {
        let harness = TokenHarness::new("ES512");
        let token = harness.issue(&VoucherClaims::print("v-9", "B-9", Some(1)), Some(300));
        let mut payload = harness.service.decode_token(&token).unwrap().payload;
        payload.claims = VoucherClaims::print("v-9", "B-9", Some(10_000));
        payload.exp = None;

        let forged = replace_segment(&token, 1, &encode_segment(&serde_json::to_vec(&payload).unwrap()));
        let result = harness
            .service
            .verify_token(&forged, harness.key_pair.public_key())
            .unwrap();
        assert!(!result.is_valid);
        assert!(result.payload.is_none());
    }

    /// Padding and the standard alphabet are rejected before any crypto.
    #[test]
    fn test_non_canonical_segments() {
        let harness = TokenHarness::new("ES256");
        let token = harness.issue(&claims(), Some(300));
        let parts: Vec<&str> = token.split('.').collect();

        let padded = format!("{}.{}==.{}", parts[0], parts[1], parts[2]);
        assert!(matches!(
            harness.service.verify_token(&padded, harness.key_pair.public_key()),
            Err(TokenError::InvalidTokenPayload(_))
        ));

        let standard = format!("{}+.{}.{}", parts[0], parts[1], parts[2]);
        assert!(matches!(
            harness.service.verify_token(&standard, harness.key_pair.public_key()),
            Err(TokenError::InvalidTokenHeader(_))
        ));

        let extra = format!("{token}.{}", parts[2]);
        assert_eq!(
            harness.service.verify_token(&extra, harness.key_pair.public_key()),
            Err(TokenError::InvalidTokenFormat)
        );
    }
}
