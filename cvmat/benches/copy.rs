/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cvmat::{Mat, MatType, Rect};
use rand::{rngs::StdRng, Rng, SeedableRng};

const SIZES: [usize; 3] = [64, 256, 1024];

fn random_f32(rng: &mut StdRng, rows: usize, cols: usize) -> Mat {
    let data: Vec<f32> = (0..rows * cols).map(|_| rng.random_range(-1.0..1.0)).collect();
    Mat::from_shape_slice(&[rows, cols], &data).unwrap()
}

fn benchmark_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy-f32");
    let mut rng = StdRng::seed_from_u64(0xc0ff33);

    for n in SIZES {
        // One extra column of padding makes the view strided.
        let parent = random_f32(&mut rng, n, n + 1);
        let continuous = parent.rect(Rect::new(0, 0, n + 1, n));
        let strided = parent.rect(Rect::new(0, 0, n, n));
        assert!(continuous.is_continuous());
        assert!(!strided.is_continuous());

        let mut dst = Mat::new(&[n, n + 1], MatType::F32C1).unwrap();
        group.bench_function(BenchmarkId::new("continuous", n), |b| {
            b.iter(|| continuous.copy_to(&mut dst).unwrap())
        });

        let mut dst = Mat::new(&[n, n], MatType::F32C1).unwrap();
        group.bench_function(BenchmarkId::new("strided", n), |b| {
            b.iter(|| strided.copy_to(&mut dst).unwrap())
        });

        group.bench_function(BenchmarkId::new("iter-sum", n), |b| {
            b.iter(|| strided.iter::<f32>().sum::<f32>())
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3));
    targets = benchmark_copy,
);
criterion_main!(benches);
