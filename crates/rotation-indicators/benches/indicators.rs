//! Benchmarks for indicator implementations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rotation_core::traits::{Indicator, MultiOutputIndicator};
use rotation_indicators::{simd, BollingerBands, Ema};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_bollinger(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bollinger");

    // 20 days of minute bars is 28800 samples
    for size in [1000, 28800, 100000].iter() {
        let data = generate_test_data(*size);
        let bb = BollingerBands::with_params((*size / 2).max(2), 2.0);

        group.bench_with_input(BenchmarkId::new("full", size), &data, |b, data| {
            b.iter(|| bb.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("latest", size), &data, |b, data| {
            b.iter(|| bb.latest(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_ema(c: &mut Criterion) {
    let mut group = c.benchmark_group("EMA");

    for size in [1000, 28800, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("seeded", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("adjusted_latest", size), &data, |b, data| {
            let ema = Ema::adjusted(*size);
            b.iter(|| ema.latest(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_window_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("WindowStats");

    for size in [1000, 28800, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("simd", size), &data, |b, data| {
            b.iter(|| simd::mean_std_simd(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_bollinger,
    benchmark_ema,
    benchmark_window_stats
);
criterion_main!(benches);
