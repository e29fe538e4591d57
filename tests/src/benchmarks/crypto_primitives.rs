//! # Crypto Primitive Benchmarks
//!
//! Performance targets:
//! - Single sign / verify: single-digit milliseconds on every curve
//! - Parallel batch verification scales with cores
//! - Code generation: microseconds per code

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use rand::RngCore;
use std::time::Duration;
use vt_crypto::{CodeGenerator, Curve, EcdsaEngine, SecureRandom, ShortCodeOptions, VerificationItem};

use crate::fixtures::key_pair;

fn random_message(size: usize) -> Vec<u8> {
    let mut message = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut message);
    message
}

pub fn bench_sign_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("vt-crypto/ecdsa");
    group.measurement_time(Duration::from_secs(5));

    let message = random_message(256);
    for curve in Curve::ALL {
        let engine = EcdsaEngine::new(curve);
        let pair = key_pair(curve);
        let signature = engine
            .sign(&message, pair.private_key().as_bytes())
            .expect("sign");

        group.bench_with_input(BenchmarkId::new("sign", curve), &curve, |b, _| {
            b.iter(|| black_box(engine.sign(&message, pair.private_key().as_bytes())))
        });
        group.bench_with_input(BenchmarkId::new("verify", curve), &curve, |b, _| {
            b.iter(|| black_box(engine.verify(&message, &signature, pair.public_key())))
        });
    }
    group.finish();
}

pub fn bench_batch_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("vt-crypto/batch_verify");
    group.measurement_time(Duration::from_secs(10));

    let engine = EcdsaEngine::new(Curve::P256);
    let pair = key_pair(Curve::P256);

    for size in [10, 100, 1_000] {
        let messages: Vec<Vec<u8>> = (0..size).map(|_| random_message(128)).collect();
        let signatures: Vec<_> = messages
            .iter()
            .map(|m| engine.sign(m, pair.private_key().as_bytes()).expect("sign"))
            .collect();
        let items: Vec<VerificationItem<'_>> = messages
            .iter()
            .zip(&signatures)
            .map(|(message, signature)| VerificationItem {
                message,
                signature,
                public_key: pair.public_key(),
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("parallel", size), &items, |b, items| {
            b.iter(|| black_box(engine.batch_verify(items)))
        });
        group.bench_with_input(BenchmarkId::new("sequential", size), &items, |b, items| {
            b.iter(|| {
                black_box(
                    items
                        .iter()
                        .filter(|i| engine.verify(i.message, i.signature, i.public_key))
                        .count(),
                )
            })
        });
    }
    group.finish();
}

pub fn bench_codes(c: &mut Criterion) {
    let mut group = c.benchmark_group("vt-crypto/codes");
    let random = SecureRandom::new();
    let codes = CodeGenerator::new(random);
    let options = ShortCodeOptions::default();

    group.bench_function("short_code", |b| {
        b.iter(|| black_box(codes.short_code(&options)))
    });
    group.bench_function("check_digit", |b| {
        b.iter(|| black_box(codes.generate_code_with_check_digit("X7KQ9MP")))
    });
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("unique_short_codes_1000", |b| {
        b.iter(|| black_box(codes.unique_short_codes(1_000, &options)))
    });
    group.bench_function("random_int", |b| {
        b.iter(|| black_box(random.random_int(0, 999_999)))
    });
    group.finish();
}
