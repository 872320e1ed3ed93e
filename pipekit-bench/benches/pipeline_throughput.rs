use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pipekit_core::pipe;

fn benchmark_stateless_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stateless_stages");

    for items in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(items));
        group.bench_with_input(BenchmarkId::new("map_filter", items), &items, |b, &items| {
            b.iter(|| {
                pipe(0..items)
                    .map(|x| black_box(x * 7))
                    .unwrap()
                    .filter(|x| x % 2 == 0)
                    .unwrap()
                    .drain()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(100_000));

    for size in [1usize, 16, 256, 4096] {
        group.bench_with_input(BenchmarkId::new("batch_size", size), &size, |b, &size| {
            b.iter(|| {
                let (batches, _) = pipe(0..100_000u64).batch(size).unwrap().collect().unwrap();
                black_box(batches)
            });
        });
    }

    group.finish();
}

fn benchmark_dedupe(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedupe");
    group.throughput(Throughput::Elements(100_000));

    for window in [Some(64usize), Some(4096), None] {
        let label = window.map_or_else(|| "unbounded".to_string(), |w| w.to_string());
        group.bench_with_input(BenchmarkId::new("window", label), &window, |b, &window| {
            b.iter(|| {
                pipe((0..100_000u64).map(|x| x % 8192))
                    .dedupe(window)
                    .unwrap()
                    .drain()
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_stateless_stages,
    benchmark_batch,
    benchmark_dedupe
);
criterion_main!(benches);
