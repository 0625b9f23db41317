//! Benchmarks for the elite archive and full search runs.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use elite_search::{
    compute::evolution::{DesignRng, EliteArchive, EliteSearch, OneMax},
    schema::{Design, OutputConfig, RunConfig},
};
use std::sync::Arc;

fn random_designs(count: usize, length: usize, seed: u64) -> Vec<Design> {
    let mut rng = DesignRng::new(seed);
    (0..count)
        .map(|_| {
            let bits: Vec<bool> = (0..length).map(|_| rng.next_seed() & 1 == 1).collect();
            let fitness = bits.iter().filter(|&&b| b).count() as f64 / length as f64;
            Design::with_fitness(bits, fitness)
        })
        .collect()
}

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_admit");

    for capacity in [8, 64, 512] {
        let designs = random_designs(1024, 100, 1);

        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let archive = EliteArchive::new(capacity);
                    for design in &designs {
                        archive.admit(black_box(design)).ok();
                    }
                    archive
                });
            },
        );
    }

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_sample");

    for capacity in [8, 64, 512] {
        let archive = EliteArchive::new(capacity);
        for design in random_designs(capacity, 100, 2) {
            archive.admit(&design).ok();
        }
        let mut rng = DesignRng::new(3);

        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| archive.sample_random(black_box(&mut rng)).ok());
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_run");
    group.sample_size(10);

    let dir = tempfile::tempdir().expect("cannot create output directory");

    for workers in [1, 4, 16] {
        let config = RunConfig {
            population_size: workers,
            elite_size: 8,
            evaluation_budget: 5_000,
            random_seed: Some(11),
            poll_interval_ms: 1,
            output: OutputConfig {
                results_path: dir.path().join("results.txt"),
                archive_path: dir.path().join("designs.json"),
            },
            ..Default::default()
        };
        let search = EliteSearch::with_problem(config, Arc::new(OneMax::new(100)))
            .expect("invalid bench config");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_workers", workers)),
            &workers,
            |b, _| {
                b.iter(|| search.run().ok());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_admission, bench_sampling, bench_search);
criterion_main!(benches);
