use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dynnet::{
    DynamicNetwork, EntityId, Interval, IntervalArena, IntervalId, IntervalIndex, Window,
};

/// Deterministic pseudo-random intervals over [0, 1000).
fn sample_intervals(n: usize) -> Vec<Interval> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..n)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let start = (state % 1000) as f64;
            let len = ((state >> 20) % 50) as f64;
            Interval::new(start, start + len, i as i64).unwrap()
        })
        .collect()
}

fn load_network(nodes: usize) -> DynamicNetwork {
    let mut net = DynamicNetwork::new(EntityId(u64::MAX), false);
    for (i, interval) in sample_intervals(nodes).into_iter().enumerate() {
        let node = EntityId(i as u64);
        let (start, end) = (interval.start().value(), interval.end().value());
        net.insert_node(node, "name", Interval::new(start, end, "n").unwrap())
            .unwrap();
        net.insert_node(node, "weight", interval).unwrap();
    }
    net.finalize();
    net
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [1_000usize, 10_000, 100_000].iter() {
        let intervals = sample_intervals(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("incremental", size), size, |b, _| {
            b.iter(|| {
                let mut index = IntervalIndex::new();
                for (i, interval) in intervals.iter().enumerate() {
                    index.insert(IntervalId(i as u64), interval, EntityId(i as u64));
                }
                black_box(index.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("bulk_load", size), size, |b, _| {
            b.iter(|| {
                let mut index = IntervalIndex::new();
                index.bulk_load(
                    intervals
                        .iter()
                        .enumerate()
                        .map(|(i, iv)| (IntervalId(i as u64), iv, EntityId(i as u64))),
                );
                black_box(index.len())
            })
        });
    }

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let intervals = sample_intervals(100_000);
    let mut index = IntervalIndex::new();
    index.bulk_load(
        intervals
            .iter()
            .enumerate()
            .map(|(i, iv)| (IntervalId(i as u64), iv, EntityId(i as u64))),
    );

    for width in [0.0, 1.0, 10.0, 100.0].iter() {
        let window = Window::new(500.0, 500.0 + width).unwrap();
        group.bench_with_input(BenchmarkId::new("overlap", width), &window, |b, w| {
            b.iter(|| black_box(index.search(black_box(w))))
        });
        group.bench_with_input(BenchmarkId::new("complement", width), &window, |b, w| {
            b.iter(|| black_box(index.search_not(black_box(w))))
        });
    }

    group.finish();
}

fn benchmark_overwrite(c: &mut Criterion) {
    c.bench_function("record_overwrite_chain_1000", |b| {
        b.iter(|| {
            let mut arena = IntervalArena::new();
            let mut record = dynnet::AttributeRecord::new(dynnet::AttributeKey::new(
                "weight",
                EntityId(1),
            ));
            for i in 0..1000 {
                let start = i as f64;
                record
                    .insert(&mut arena, Interval::new(start, start + 5.0, i).unwrap())
                    .unwrap();
            }
            black_box(record.intervals().len())
        })
    });
}

fn benchmark_animation(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation");

    for nodes in [1_000usize, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("advance", nodes), nodes, |b, &n| {
            let mut net = load_network(n);
            let mut t = 0.0;
            b.iter(|| {
                t = (t + 1.0) % 1000.0;
                let frame = net.advance(Window::new(t, t + 1.0).unwrap());
                black_box(frame.total_changes())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_search,
    benchmark_overwrite,
    benchmark_animation
);
criterion_main!(benches);
