use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mltuning::benchmark::{BenchmarkConfig, MLTuning};
use mltuning::data::InMemorySource;
use mltuning::optimizer::HyperparameterConfig;
use std::sync::Arc;

fn synthetic(regressor: &str, dimension: usize) -> MLTuning {
    let config = BenchmarkConfig::new(regressor)
        .with_data_dimension(dimension)
        .with_random_state(0);
    MLTuning::with_source(config, Arc::new(InMemorySource::new())).unwrap()
}

fn bench_tree_objective(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_objective");

    for dimension in [1, 2, 3, 5].iter() {
        let bench = synthetic("decision_tree_depth", *dimension);
        // Materialize outside the timed loop
        bench.prepared().unwrap();

        group.bench_with_input(BenchmarkId::new("depth_8", dimension), &bench, |b, bench| {
            let config = HyperparameterConfig::new().with("depth", 8i64);
            b.iter(|| bench.objective(black_box(&config)).unwrap())
        });
    }

    group.finish();
}

fn bench_mlp_objective(c: &mut Criterion) {
    let mut group = c.benchmark_group("mlp_objective");
    group.sample_size(10);

    let bench = synthetic("mlp", 2);
    bench.prepared().unwrap();

    for solver in ["lbfgs", "sgd", "adam"].iter() {
        let config = HyperparameterConfig::new()
            .with("activation", "relu")
            .with("solver", *solver)
            .with("learning_rate", "constant")
            .with("alpha", 1e-4);

        group.bench_with_input(BenchmarkId::new("solver", solver), &config, |b, config| {
            b.iter(|| bench.objective(black_box(config)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_objective, bench_mlp_objective);
criterion_main!(benches);
