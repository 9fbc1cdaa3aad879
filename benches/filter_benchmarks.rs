//! Benchmarks for angle smoothing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use movement_analysis::{
    config::SmoothingConfig,
    filters::{exponential::ExponentialFilter, AngleFilter, NoFilter},
    geometry::JointId,
    smoother::SignalSmoother,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const FRAME_MS: f32 = 1000.0 / 30.0;

/// Noisy knee angle trace
fn test_data(len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..len)
        .map(|i| {
            let t = i as f32 * 0.1;
            100.0 + 70.0 * t.cos() + rng.gen_range(-2.0..2.0)
        })
        .collect()
}

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");
    let data = test_data(100);

    let filter_configs = vec![
        ("no_filter", Box::new(NoFilter) as Box<dyn AngleFilter>),
        ("exponential_0.3", Box::new(ExponentialFilter::new(0.3))),
        ("exponential_0.8", Box::new(ExponentialFilter::new(0.8))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("single_update", name), &data[0], |b, &angle| {
            b.iter(|| black_box(filter.apply(black_box(angle), black_box(FRAME_MS))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &angle in data {
                    black_box(filter.apply(black_box(angle), black_box(FRAME_MS)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_variable_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("variable_rate");
    let data = test_data(100);

    for interval_ms in [33.3f32, 66.7, 200.0] {
        let mut filter = ExponentialFilter::new(0.3);
        group.bench_with_input(BenchmarkId::new("exponential", interval_ms), &interval_ms, |b, &interval| {
            b.iter(|| {
                filter.reset();
                for &angle in &data {
                    black_box(filter.apply(black_box(angle), interval));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoother");
    let data = test_data(100);
    let mut smoother = SignalSmoother::new(&SmoothingConfig::default()).unwrap();

    group.bench_function("all_joints_sequence_100", |b| {
        b.iter(|| {
            smoother.reset();
            for (i, &angle) in data.iter().enumerate() {
                let ts = i as u64 * 33;
                for joint in JointId::ALL {
                    // every fifth frame is missing
                    let raw = (i % 5 != 0).then_some(angle);
                    black_box(smoother.update(joint, raw, ts));
                }
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_filters, benchmark_variable_rate, benchmark_smoother);
criterion_main!(benches);
