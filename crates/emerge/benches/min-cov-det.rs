use criterion::*;

use emerge::{
    outlier::{MinCovDet, OutlierDetector},
    MetricRecord,
};
use symagen::contamination::Contaminated;

/// Gaussian records with 10% shifted outliers.
fn records(cardinality: usize, dimensionality: usize) -> Vec<MetricRecord> {
    let num_outliers = cardinality / 10;
    Contaminated::gaussian(cardinality - num_outliers, num_outliers, dimensionality, 5.0, 42)
        .metrics
        .into_iter()
        .map(|m| MetricRecord::new(m, Vec::new()))
        .collect()
}

fn mcd_car(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcd-car");
    group.significance_level(0.025).sample_size(10);

    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    group.plot_config(plot_config);

    group.sampling_mode(SamplingMode::Flat);

    for n in [1_000, 10_000, 100_000] {
        let data = records(n, 4);

        let id = BenchmarkId::new("train-4", n);
        group.bench_with_input(id, &n, |b, _| {
            b.iter(|| {
                let mut detector = MinCovDet::new(4, Some(42));
                detector.train(&data)
            });
        });

        let mut detector = MinCovDet::new(4, Some(42));
        if detector.train(&data).is_ok() {
            let id = BenchmarkId::new("score-4", n);
            group.bench_with_input(id, &n, |b, _| {
                b.iter_with_large_drop(|| detector.score_all(data.clone()));
            });
        }
    }
    group.finish();
}

fn mcd_dim(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcd-dim");
    group.significance_level(0.025).sample_size(10);

    group.sampling_mode(SamplingMode::Flat);

    for dim in [2, 4, 8, 16] {
        let data = records(10_000, dim);

        let id = BenchmarkId::new("train-10k", dim);
        group.bench_with_input(id, &dim, |b, &dim| {
            b.iter(|| {
                let mut detector = MinCovDet::new(dim, Some(42));
                detector.train(&data)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, mcd_car, mcd_dim);
criterion_main!(benches);
