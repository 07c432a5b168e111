use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use bog_rs::{BestOverlapGraph, GraphConfig, InMemoryOverlapSource, Overlap};

/// Benchmarks for best overlap graph construction on tiled synthetic layouts.

fn generate_tiled_overlaps(n: usize, read_len: i32, step: i32, depth: usize) -> InMemoryOverlapSource {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let lengths = vec![read_len as u32; n];
    let mut source = InMemoryOverlapSource::new(&lengths);

    // read i starts at i * step; each read overlaps the next `depth` reads
    for a in 0..n {
        for k in 1..=depth {
            let b = a + k;
            if b >= n {
                break;
            }
            let hang = step * k as i32;
            if hang >= read_len {
                break;
            }
            let overlap = Overlap::new(
                a as u32 + 1,
                b as u32 + 1,
                hang,
                hang,
                false,
                rng.gen_range(0..400),
            );
            source.add_mirrored(overlap).unwrap();
        }
    }
    source
}

fn bench_dense_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_build");
    group.measurement_time(Duration::from_secs(10));

    for n in [1_000, 10_000, 50_000].iter() {
        let source = generate_tiled_overlaps(*n, 1000, 100, 8);

        group.bench_with_input(BenchmarkId::new("build", n), &source, |b, source| {
            b.iter(|| {
                let _graph = BestOverlapGraph::build(black_box(source), GraphConfig::default()).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_restricted_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("restricted_build");
    group.measurement_time(Duration::from_secs(10));

    let n = 50_000;
    let source = generate_tiled_overlaps(n, 1000, 100, 8);
    for keep in [100u32, 1_000, 10_000].iter() {
        let config = GraphConfig {
            restrict: Some((1..=*keep).collect()),
            ..GraphConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("build", keep), &config, |b, config| {
            b.iter(|| {
                let _graph = BestOverlapGraph::build(black_box(&source), config.clone()).unwrap();
            });
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_threaded_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("threaded_build");
    group.measurement_time(Duration::from_secs(10));

    let source = generate_tiled_overlaps(50_000, 1000, 100, 8);
    for workers in [1usize, 2, 4, 8].iter() {
        let config = GraphConfig {
            use_threads: true,
            max_workers: *workers,
            ..GraphConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("workers", workers), &config, |b, config| {
            b.iter(|| {
                let _graph = BestOverlapGraph::build(black_box(&source), config.clone()).unwrap();
            });
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
criterion_group!(benches, bench_dense_build, bench_restricted_build, bench_threaded_build);
#[cfg(not(feature = "parallel"))]
criterion_group!(benches, bench_dense_build, bench_restricted_build);
criterion_main!(benches);
