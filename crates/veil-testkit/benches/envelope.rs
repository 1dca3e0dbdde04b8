//! Envelope benchmarks: digesting, obscuring and serialization.

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use veil::{Envelope, ObscureAction};
use veil_core::SymmetricKey;

/// A node with `width` assertions, each object carrying `depth` nested levels.
fn build(width: usize, depth: usize) -> Envelope {
    (0..width).fold(Envelope::new("subject"), |e, i| {
        let object = (0..depth).fold(Envelope::new(i as u64), |o, d| {
            o.add_assertion(format!("level-{d}"), d as u64)
        });
        e.add_assertion(format!("predicate-{i}"), object)
    })
}

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");
    for width in [4usize, 32, 256] {
        group.bench_with_input(BenchmarkId::new("cold", width), &width, |b, &width| {
            b.iter(|| black_box(build(width, 2)).digest())
        });
        let warm = build(width, 2);
        warm.digest();
        group.bench_with_input(BenchmarkId::new("memoized", width), &warm, |b, e| {
            b.iter(|| black_box(e).digest())
        });
    }
    group.finish();
}

fn bench_obscure(c: &mut Criterion) {
    let e = build(64, 2);
    let targets: HashSet<_> = e.assertions().iter().step_by(2).map(|a| a.digest()).collect();
    let key = SymmetricKey::from_bytes([7; 32]);

    c.bench_function("elide_half", |b| {
        b.iter(|| black_box(&e).elide_removing_set(&targets))
    });
    c.bench_function("encrypt_half", |b| {
        b.iter(|| {
            black_box(&e)
                .elide_removing_set_with_action(&targets, &ObscureAction::Encrypt(key.clone()))
                .unwrap()
        })
    });
    c.bench_function("compress_half", |b| {
        b.iter(|| {
            black_box(&e)
                .elide_removing_set_with_action(&targets, &ObscureAction::Compress)
                .unwrap()
        })
    });
}

fn bench_cbor(c: &mut Criterion) {
    let e = build(64, 2);
    let bytes = e.to_cbor_data();

    c.bench_function("to_cbor_data", |b| b.iter(|| black_box(&e).to_cbor_data()));
    c.bench_function("from_cbor_data", |b| {
        b.iter(|| Envelope::from_cbor_data(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_digest, bench_obscure, bench_cbor);
criterion_main!(benches);
