//! Dispatch throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowproc_common::SystemClock;
use flowproc_core::{Engine, EngineConfig, NullWork};

fn bench_sustained_dispatch(c: &mut Criterion) {
    c.bench_function("dispatch_10k_repeating_keys", |b| {
        b.iter(|| {
            let mut engine = Engine::new(EngineConfig::default(), SystemClock, NullWork);
            for i in 0..10_000u32 {
                engine.process_packet(black_box(i % 500));
            }
        });
    });
}

fn bench_cold_flow_creation(c: &mut Criterion) {
    c.bench_function("dispatch_10k_unique_keys", |b| {
        b.iter(|| {
            let mut engine = Engine::new(EngineConfig::default(), SystemClock, NullWork);
            for i in 0..10_000u32 {
                engine.process_packet(black_box(i));
            }
        });
    });
}

criterion_group!(benches, bench_sustained_dispatch, bench_cold_flow_creation);
criterion_main!(benches);
