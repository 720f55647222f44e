use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harvest_reservoir::config::MAX_TXN_EVENTS;
use harvest_reservoir::{EventReservoir, JsonEvent};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Serialize, Clone)]
struct TxnEvent {
    name: &'static str,
    timestamp: u64,
    duration: f64,
    queue_duration: f64,
}

fn txn_event() -> JsonEvent<TxnEvent> {
    JsonEvent(TxnEvent {
        name: "WebTransaction/Rust/zip/zap",
        timestamp: 1_700_000_000,
        duration: 2.0,
        queue_duration: 1.0,
    })
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    // Admission cost should stay flat once the reservoir is full.
    let sizes = [1_000, 10_000, 100_000];
    let k = 1_000;

    for &size in &sizes {
        group.bench_function(format!("add_n{}_k{}", size, k), |b| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(1);
                let mut events = EventReservoir::new(k);
                for i in 0..size {
                    events.add_with_rng(black_box(i), &mut rng);
                }
                black_box(events.num_saved());
            })
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let k = 1_000;

    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut dest = EventReservoir::new(k);
    let mut src = EventReservoir::new(k);
    for i in 0..10 * k {
        dest.add_with_rng(i, &mut rng);
        src.add_with_rng(i, &mut rng);
    }

    group.bench_function(format!("merge_full_k{}", k), |b| {
        b.iter(|| {
            let mut d = dest.clone();
            d.merge(black_box(src.clone()));
            black_box(d.num_saved());
        })
    });
    group.finish();
}

fn bench_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect");

    let mut events = EventReservoir::new(MAX_TXN_EVENTS);
    for _ in 0..MAX_TXN_EVENTS {
        events.add(txn_event());
    }

    group.bench_function("txn_events_collect", |b| {
        b.iter(|| {
            let payload = events.collect(black_box("12345"));
            black_box(payload.is_ok());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_add, bench_merge, bench_collect);
criterion_main!(benches);
