use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use metrics_native_histogram::{FloatHistogram, HistogramConfig, InsertCursor, SparseLayout};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_layout(rng: &mut SmallRng, buckets: usize) -> SparseLayout {
    let mut layout = SparseLayout::new();
    let mut cursor = InsertCursor::new();
    let mut index = rng.random_range(-20..0);
    for _ in 0..buckets {
        // Mostly dense, with the occasional wider gap.
        index += if rng.random_range(0..8) == 0 { rng.random_range(2..10) } else { 1 };
        let count = f64::from(rng.random_range(0u32..100));
        layout.insert_or_accumulate(index, count, &mut cursor).expect("indexes are ascending");
    }
    layout
}

fn random_histogram(rng: &mut SmallRng, buckets: usize) -> FloatHistogram {
    let config = HistogramConfig::new(3, 1e-9).expect("valid config");
    let positive = random_layout(rng, buckets);
    let negative = random_layout(rng, buckets / 4);
    let zero_count = f64::from(rng.random_range(0u32..10));
    let count = zero_count + positive.total() + negative.total();
    FloatHistogram::from_parts(config, zero_count, count, count * 1.5, positive, negative).expect("valid layouts")
}

fn operations_benchmark(c: &mut Criterion) {
    // Start with a seeded RNG so that we predictably regenerate our data.
    let mut rng = SmallRng::seed_from_u64(42);

    let mut group = c.benchmark_group("FloatHistogram");
    for buckets in [16, 160] {
        let base = random_histogram(&mut rng, buckets);
        let other = random_histogram(&mut rng, buckets);

        group.bench_function(format!("add and compact ({} buckets)", buckets), |b| {
            b.iter_batched_ref(
                || base.clone(),
                |h| {
                    h.add(&other).expect("compatible histograms").compact(2);
                },
                BatchSize::SmallInput,
            )
        });

        let mut current = base.clone();
        current.add(&other).expect("compatible histograms").compact(0);
        group.bench_function(format!("detect reset ({} buckets)", buckets), |b| {
            b.iter(|| current.detect_reset(&base))
        });

        group.bench_function(format!("all buckets ({} buckets)", buckets), |b| {
            b.iter(|| current.all_buckets().map(|bucket| bucket.count).sum::<f64>())
        });
    }
    group.finish();
}

criterion_group!(benches, operations_benchmark);
criterion_main!(benches);
