use barline_sdk::Aggregator;
use barline_types::{Segment, Severity};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark a single update with varying slot counts
fn bench_update_varying_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_varying_slots");

    for slot_count in [1usize, 5, 12, 50].iter() {
        let names: Vec<String> = (0..*slot_count).map(|i| format!("slot-{}", i)).collect();
        let aggregator = Aggregator::with_slots(&names).unwrap();
        for name in &names {
            aggregator
                .update(name, Segment::new(name.as_str(), "ok", Severity::Good))
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(slot_count), slot_count, |b, _| {
            b.iter(|| {
                black_box(
                    aggregator
                        .update("slot-0", Segment::new("slot-0", "tick", Severity::Neutral))
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

/// Benchmark update cost with subscribers attached
fn bench_update_with_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_with_subscribers");

    for subscriber_count in [0usize, 1, 4].iter() {
        let aggregator = Aggregator::with_slots(["clock", "disk", "load"]).unwrap();
        let mut receivers: Vec<_> = (0..*subscriber_count).map(|_| aggregator.subscribe()).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                b.iter(|| {
                    aggregator
                        .update("clock", Segment::new("clock", "12:00", Severity::Neutral))
                        .unwrap();
                    for rx in receivers.iter_mut() {
                        black_box(rx.try_recv().ok());
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark reading the current snapshot (renderer path)
fn bench_current_snapshot(c: &mut Criterion) {
    let aggregator = Aggregator::with_slots(["clock", "disk"]).unwrap();
    aggregator
        .update("disk", Segment::new("disk", "D: 1GiB/2GiB", Severity::Good))
        .unwrap();

    c.bench_function("current_snapshot", |b| {
        b.iter(|| black_box(aggregator.current_snapshot()));
    });
}

criterion_group!(
    benches,
    bench_update_varying_slots,
    bench_update_with_subscribers,
    bench_current_snapshot,
);
criterion_main!(benches);
