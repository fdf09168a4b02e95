use chainspawn_core::analysis::analyze_distribution;
use chainspawn_core::particles::{initialize_particles, initialize_particles_batch, BatchOptions};
use chainspawn_core::rng::Prng;
use chainspawn_data::{ParticleInitConfig, SpatialPattern};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn config(total: usize, pattern: SpatialPattern) -> ParticleInitConfig {
    ParticleInitConfig {
        total_count: total,
        pattern,
        ..ParticleInitConfig::default()
    }
}

/// Benchmark single-shot allocation of a typical organism.
fn bench_allocate_500(c: &mut Criterion) {
    let cfg = config(500, SpatialPattern::Uniform);

    c.bench_function("allocate_500_uniform", |b| {
        b.iter(|| {
            let mut rng = Prng::with_seed(42);
            let result = initialize_particles(&mut rng, black_box(&cfg));
            black_box(result)
        })
    });
}

/// Benchmark spherical layout, the most expensive position path.
fn bench_allocate_spherical(c: &mut Criterion) {
    let cfg = config(1000, SpatialPattern::Spherical);

    c.bench_function("allocate_1000_spherical", |b| {
        b.iter(|| {
            let mut rng = Prng::with_seed(42);
            black_box(initialize_particles(&mut rng, black_box(&cfg)))
        })
    });
}

/// Benchmark batched allocation overhead.
fn bench_allocate_batched(c: &mut Criterion) {
    let cfg = config(1000, SpatialPattern::Lattice);

    c.bench_function("allocate_1000_batched_50", |b| {
        b.iter(|| {
            let mut rng = Prng::with_seed(42);
            let result = initialize_particles_batch(
                &mut rng,
                black_box(&cfg),
                BatchOptions {
                    batch_size: 50,
                    on_progress: None,
                },
            );
            black_box(result)
        })
    });
}

/// Benchmark exact pairwise metrics at the sampling threshold.
fn bench_analyze_distribution(c: &mut Criterion) {
    let cfg = config(2048, SpatialPattern::Uniform);
    let result = initialize_particles(&mut Prng::with_seed(7), &cfg);
    let particles = result.map(|r| r.particles).unwrap_or_default();

    c.bench_function("analyze_2048", |b| {
        b.iter(|| black_box(analyze_distribution(black_box(&particles))))
    });
}

criterion_group!(
    benches,
    bench_allocate_500,
    bench_allocate_spherical,
    bench_allocate_batched,
    bench_analyze_distribution
);
criterion_main!(benches);
