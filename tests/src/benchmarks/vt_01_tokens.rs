//! # VT-01 Redemption Token Benchmarks
//!
//! Performance targets:
//! - Issue: dominated by one ECDSA signature
//! - Verify: dominated by one ECDSA verification, parse and claim checks are noise
//! - Batch verify: near-linear speedup over sequential verification

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use vt_01_redemption_tokens::{TokenApi, VoucherClaims};
use vt_crypto::Curve;

use crate::fixtures::TokenHarness;

pub fn bench_token_issue_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("vt-01/tokens");
    group.measurement_time(Duration::from_secs(5));

    let claims = VoucherClaims::print("v-bench", "PIKA-2026-10-X7K", Some(100));
    for curve in Curve::ALL {
        let harness = TokenHarness::new(curve.algorithm());
        let token = harness.issue(&claims, Some(3600));

        group.bench_with_input(BenchmarkId::new("issue", curve), &curve, |b, _| {
            b.iter(|| {
                black_box(harness.service.generate_token(
                    &claims,
                    harness.key_pair.private_key().as_bytes(),
                    Some(3600),
                ))
            })
        });
        group.bench_with_input(BenchmarkId::new("verify", curve), &curve, |b, _| {
            b.iter(|| black_box(harness.service.verify_token(&token, harness.key_pair.public_key())))
        });
        group.bench_with_input(BenchmarkId::new("decode", curve), &curve, |b, _| {
            b.iter(|| black_box(harness.service.decode_token(&token)))
        });
    }
    group.finish();
}

pub fn bench_token_batch_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("vt-01/batch_verify");
    group.measurement_time(Duration::from_secs(10));

    let harness = TokenHarness::new("ES256");
    for size in [10, 100, 1_000] {
        let tokens: Vec<String> = (0..size)
            .map(|i| harness.issue(&VoucherClaims::user(format!("v-{i}"), format!("u-{i}")), Some(3600)))
            .collect();
        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &refs, |b, refs| {
            b.iter(|| black_box(harness.service.batch_verify(refs, harness.key_pair.public_key())))
        });
    }
    group.finish();
}
