use chrono::{NaiveDate, TimeDelta};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_rs::algorithms::trend::segment;
use ripple_rs::{
    compare_graphs, compute_trend, partition, AbsoluteTolerance, AnalysisConfig, Excursion,
    GlucoseAnalyzer, InsulinEvent, InsulinKind, RelativeTolerance, Sample,
};

/// Synthetic 5-minute CGM trace: a 6 hour oscillation with a slower drift.
fn cgm_series(n: usize) -> Vec<Sample> {
    let t0 = NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let t = i as f64;
            let v = 140.0
                + 45.0 * (t * std::f64::consts::TAU / 72.0).sin()
                + 15.0 * (t * std::f64::consts::TAU / 288.0).cos();
            Sample::new(t0 + TimeDelta::minutes(5 * i as i64), v.round())
        })
        .collect()
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    for n in [1_000, 10_000, 100_000] {
        let trend = compute_trend(&cgm_series(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| partition(black_box(&trend), 1, 30))
        });
    }
    group.finish();
}

fn bench_compare_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_graphs");
    group.sample_size(10);
    for n in [2_000, 10_000, 40_000] {
        let excursions: Vec<Excursion> =
            segment(&cgm_series(n), &AnalysisConfig::new(1, 30)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("relative", excursions.len()),
            &excursions,
            |b, ex| b.iter(|| compare_graphs::<RelativeTolerance>(black_box(ex), 0.05)),
        );
        group.bench_with_input(
            BenchmarkId::new("absolute", excursions.len()),
            &excursions,
            |b, ex| b.iter(|| compare_graphs::<AbsoluteTolerance>(black_box(ex), 0.05)),
        );
    }
    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let samples = cgm_series(20_000);
    let insulin: Vec<InsulinEvent> = samples
        .iter()
        .step_by(40)
        .enumerate()
        .map(|(i, s)| {
            let kind = if i % 3 == 0 {
                InsulinKind::SlowActing
            } else {
                InsulinKind::FastActing
            };
            InsulinEvent::new(s.timestamp, kind, 4.0)
        })
        .collect();
    let analyzer = GlucoseAnalyzer::new(AnalysisConfig::new(1, 30));

    c.bench_function("analyze_20k", |b| {
        b.iter(|| analyzer.analyze(black_box(&samples), black_box(&insulin)))
    });
}

#[cfg(feature = "parallel")]
fn bench_analyze_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_thread_scaling");
    group.sample_size(10);

    let samples = cgm_series(40_000);
    let analyzer = GlucoseAnalyzer::new(AnalysisConfig::new(1, 30));

    for threads in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("threads", threads),
            &threads,
            |b, &threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                b.iter(|| pool.install(|| analyzer.analyze(black_box(&samples), &[])));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_partition, bench_compare_graphs, bench_analyze);

#[cfg(feature = "parallel")]
criterion_group!(parallel_benches, bench_analyze_thread_scaling);

#[cfg(feature = "parallel")]
criterion_main!(benches, parallel_benches);

#[cfg(not(feature = "parallel"))]
criterion_main!(benches);
