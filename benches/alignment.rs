//! Alignment benchmarks
//!
//! Interpolation onto a grid and full group aggregation at typical sweep
//! sizes (a handful of seeds, tens of thousands of logged steps).
//!
//! Run with: cargo bench --bench alignment

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_report::align::{interp, linspace, Aggregator, ColumnStats, Statistic};
use trueno_report::experiment::ScalarSeries;

const SMALL_SIZE: usize = 1_000; // 1K steps
const LARGE_SIZE: usize = 100_000; // 100K steps

#[allow(clippy::cast_precision_loss)]
fn series(len: usize, offset: i64, phase: f64) -> ScalarSeries {
    let steps: Vec<i64> = (0..len as i64).map(|i| i * 3 + offset).collect();
    let values: Vec<f64> = steps.iter().map(|&s| (s as f64 * 1e-3 + phase).sin()).collect();
    ScalarSeries::from_steps_values(&steps, &values)
}

fn sweep(len: usize, seeds: usize) -> BTreeMap<String, ScalarSeries> {
    let mut runs = BTreeMap::new();
    for lr in ["lr0.1", "lr0.01"] {
        for seed in 0..seeds {
            #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
            let run = series(len, seed as i64, seed as f64 * 0.1);
            runs.insert(format!("sweep/{lr}/seed{seed}"), run);
        }
    }
    runs
}

/// Benchmark linear interpolation onto a 1000-point grid
fn bench_interp(c: &mut Criterion) {
    let mut group = c.benchmark_group("interp");

    for size in [SMALL_SIZE, LARGE_SIZE] {
        let run = series(size, 0, 0.0);
        #[allow(clippy::cast_precision_loss)]
        let xp: Vec<f64> = run.steps().iter().map(|&s| s as f64).collect();
        let grid = linspace(xp[0], xp[xp.len() - 1], 1_000);
        group.bench_with_input(BenchmarkId::new("grid_1000", size), &size, |b, _| {
            b.iter(|| interp(black_box(&grid), black_box(&xp), black_box(run.values())));
        });
    }

    group.finish();
}

/// Benchmark per-column statistics across members
fn bench_column_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_stats");

    for members in [4usize, 64] {
        #[allow(clippy::cast_precision_loss)]
        let column: Vec<f64> = (0..members).map(|i| (i as f64).cos()).collect();
        group.bench_with_input(BenchmarkId::new("members", members), &column, |b, column| {
            b.iter(|| ColumnStats::of(black_box(column)));
        });
    }

    group.finish();
}

/// Benchmark end-to-end group aggregation
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [SMALL_SIZE, LARGE_SIZE] {
        let runs = sweep(size, 5);
        group.bench_with_input(BenchmarkId::new("std", size), &runs, |b, runs| {
            let aggregator = Aggregator::new(100).stats_key("/seed");
            b.iter(|| aggregator.aggregate(black_box(runs)));
        });
        group.bench_with_input(BenchmarkId::new("min_max", size), &runs, |b, runs| {
            let aggregator = Aggregator::new(100)
                .stats_key("/seed")
                .statistic(Statistic::MinMax);
            b.iter(|| aggregator.aggregate(black_box(runs)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interp, bench_column_stats, bench_aggregate);
criterion_main!(benches);
