use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use netpulse_sdk::{
    CounterSample, MemoryStore, SharedStore, StatsPublisher, ThroughputSnapshot, Timestamp,
    STATS_KEY,
};
use std::sync::Arc;

fn sample_snapshot() -> ThroughputSnapshot {
    let sample = CounterSample::new(48_318_382_080, 5_368_709_120, Timestamp::from_secs(1_703_160_000));
    ThroughputSnapshot::measured(&sample, netpulse_sdk::Throughput::new(12.5, 1.75), true)
}

/// Benchmark JSON serialization of the shared record
fn bench_json_serialization(c: &mut Criterion) {
    let snapshot = sample_snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();

    let mut group = c.benchmark_group("json_serialization");
    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("to_string", |b| {
        b.iter(|| {
            black_box(serde_json::to_string(black_box(&snapshot)).unwrap());
        });
    });
    group.bench_function("to_value", |b| {
        b.iter(|| {
            black_box(serde_json::to_value(black_box(snapshot)).unwrap());
        });
    });
    group.finish();
}

/// Benchmark JSON deserialization
fn bench_json_deserialization(c: &mut Criterion) {
    let json = serde_json::to_string(&sample_snapshot()).unwrap();

    let mut group = c.benchmark_group("json_deserialization");
    group.bench_function("deserialize", |b| {
        b.iter(|| {
            let _: ThroughputSnapshot = black_box(serde_json::from_str(&json).unwrap());
        });
    });
    group.finish();
}

/// Benchmark a full publish into the in-memory store
fn bench_publish(c: &mut Criterion) {
    let store = Arc::new(MemoryStore::new("group.bench"));
    let publisher = StatsPublisher::new(store.clone());
    let snapshot = sample_snapshot();

    c.bench_function("publish_memory_store", |b| {
        b.iter(|| {
            publisher.publish(black_box(snapshot)).unwrap();
        });
    });

    c.bench_function("read_memory_store", |b| {
        b.iter(|| {
            black_box(store.read_entry(STATS_KEY).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_json_serialization,
    bench_json_deserialization,
    bench_publish,
);
criterion_main!(benches);
