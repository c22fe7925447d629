//! Performance benchmarks for the decomposition engine.
//!
//! Run with: cargo bench

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use apsplit::backtest::Simulator;
use apsplit::data::PricePoint;
use apsplit::decompose::{decompose, rolling_decompose, DecompositionConfig};
use apsplit::metrics::{compute_stats, MetricsConfig};
use apsplit::strategies::MomentumTilt;
use apsplit::types::{AlignedSeries, NonFinitePolicy};

/// Generate a deterministic synthetic weight/return series.
fn generate_series(count: usize) -> AlignedSeries {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let periods = (0..count)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let weights = (0..count)
        .map(|i| 1.0 + 0.3 * (i as f64 * 0.7).sin())
        .collect();
    let returns = (0..count)
        .map(|i| 0.01 * (i as f64 * 1.3).cos())
        .collect();

    AlignedSeries::from_parts(periods, weights, returns, NonFinitePolicy::Fail).unwrap()
}

/// Generate deterministic synthetic prices.
fn generate_prices(count: usize) -> Vec<PricePoint> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut price = 100.0;
    (0..count)
        .map(|i| {
            let noise = ((i as f64 * 0.7).sin() * 2.0 + (i as f64 * 1.3).cos()) * 0.5;
            price += 0.001 * price + noise;
            price = price.max(50.0);
            PricePoint::new(start + chrono::Duration::days(i as i64), price)
        })
        .collect()
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    let config = DecompositionConfig::default();

    for size in [252, 1000, 5000].iter() {
        let series = generate_series(*size);
        group.bench_with_input(BenchmarkId::new("single", size), &series, |b, series| {
            b.iter(|| decompose(black_box(series), &config))
        });
    }

    let series = generate_series(2000);
    group.bench_function("rolling_252_over_2000", |b| {
        b.iter(|| rolling_decompose(black_box(&series), 252, &config))
    });

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let config = MetricsConfig::default();

    for size in [252, 1000, 5000].iter() {
        let returns: Vec<f64> = (0..*size).map(|i| 0.01 * (i as f64 * 1.3).cos()).collect();
        group.bench_with_input(
            BenchmarkId::new("compute_stats", size),
            &returns,
            |b, returns| b.iter(|| compute_stats(black_box(returns), &config)),
        );
    }

    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    let simulator = Simulator::with_defaults();

    for size in [252, 2000].iter() {
        let prices = generate_prices(*size);
        group.bench_with_input(
            BenchmarkId::new("momentum_dca", size),
            &prices,
            |b, prices| {
                b.iter(|| {
                    let mut strategy = MomentumTilt::default_params();
                    simulator.run(black_box(prices), &mut strategy)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decompose, bench_metrics, bench_simulation);
criterion_main!(benches);
