//! Strategy comparison across matrix sizes.
//!
//! # Usage:
//! ```bash
//! # Every strategy, flat and row storage, plus ndarray as a baseline
//! cargo bench --bench matmul
//!
//! # One size only
//! cargo bench --bench matmul -- matmul_512
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use rand::prelude::*;

use tilemm::{FlatMatrix, Kernel, KernelConfig, RowMatrix, Storage, Strategy};

fn bench_layout<S: Storage>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    layout: &str,
    size: usize,
) {
    let mut rng = StdRng::seed_from_u64(42);
    let a = S::random(size, &mut rng).unwrap();
    let b = S::random(size, &mut rng).unwrap();
    let mut c = S::zeros(size).unwrap();

    for strategy in Strategy::ALL {
        // The naive kernel is far too slow to be interesting past 256.
        if strategy == Strategy::Naive && size > 256 {
            continue;
        }

        let kernel = Kernel::new(KernelConfig::for_strategy(strategy).with_dim(size)).unwrap();
        group.bench_function(BenchmarkId::new(strategy.to_string(), layout), |bench| {
            bench.iter(|| {
                kernel
                    .multiply(black_box(&a), black_box(&b), black_box(&mut c))
                    .unwrap();
            });
        });
    }
}

fn bench_matmul_by_size(c: &mut Criterion) {
    for size in [128, 256, 512, 1024] {
        let mut group = c.benchmark_group(format!("matmul_{size}"));
        group.sample_size(10);
        group.throughput(Throughput::Elements(2 * (size as u64).pow(3)));

        bench_layout::<FlatMatrix>(&mut group, "flat", size);
        bench_layout::<RowMatrix>(&mut group, "rows", size);

        let mut rng = StdRng::seed_from_u64(42);
        let a_nd = Array2::from_shape_fn((size, size), |_| rng.random_range(0.0f32..10.0));
        let b_nd = Array2::from_shape_fn((size, size), |_| rng.random_range(0.0f32..10.0));
        group.bench_function("ndarray", |bench| {
            bench.iter(|| black_box(black_box(&a_nd).dot(black_box(&b_nd))));
        });

        group.finish();
    }
}

criterion_group!(benches, bench_matmul_by_size);
criterion_main!(benches);
