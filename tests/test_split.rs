//! Integration test: partition invariants for every dataset kind

use mltuning::benchmark::{BenchmarkConfig, MLTuning, CV_FOLDS, NUM_DATA};
use mltuning::data::{Dataset, DatasetName, DatasetSource, InMemorySource, TargetFunction};
use mltuning::split::Split;
use ndarray::{Array1, Array2};
use std::collections::HashSet;
use std::sync::Arc;

fn real_world(n: usize, d: usize) -> Arc<dyn DatasetSource> {
    let features = Array2::from_shape_fn((n, d), |(r, c)| ((r * 31 + c * 17) % 97) as f64);
    let labels = Array1::from_shape_fn(n, |r| r as f64);
    let ds = Dataset::new(features, labels).unwrap();
    Arc::new(
        InMemorySource::new()
            .with_dataset(DatasetName::Diabetes, ds.clone())
            .with_dataset(DatasetName::Boston, ds),
    )
}

fn prepared_split(config: BenchmarkConfig, source: Arc<dyn DatasetSource>) -> Split {
    let bench = MLTuning::with_source(config, source).unwrap();
    bench.prepared().unwrap().split.clone()
}

fn assert_folds_partition_pool(split: &Split) {
    assert_eq!(split.folds.len(), CV_FOLDS);
    let n = split.train_pool.n_samples();
    let mut validated = Vec::new();
    for fold in &split.folds {
        let train: HashSet<usize> = fold.train_indices.iter().copied().collect();
        let validation: HashSet<usize> = fold.validation_indices.iter().copied().collect();
        assert!(train.is_disjoint(&validation));
        assert_eq!(train.len() + validation.len(), n);
        assert!(train.union(&validation).all(|&i| i < n));
        assert_eq!(fold.train.n_samples(), train.len());
        assert_eq!(fold.validation.n_samples(), validation.len());
        validated.extend(fold.validation_indices.iter().copied());
    }
    // Every pool row is validated exactly once
    validated.sort_unstable();
    assert_eq!(validated, (0..n).collect::<Vec<_>>());
}

#[test]
fn test_real_world_train_and_test_disjoint() {
    for name in ["diabetes", "boston"] {
        let config = BenchmarkConfig::new("decision_tree")
            .with_dataset(name)
            .with_random_state(5);
        let split = prepared_split(config, real_world(101, 4));

        let train = split.train_rows.clone().unwrap();
        let test = split.test_rows.clone().unwrap();
        let train_set: HashSet<usize> = train.iter().copied().collect();
        assert!(test.iter().all(|r| !train_set.contains(r)));
        assert_eq!(train.len() + test.len(), 101);
        assert_eq!(test.len(), 51);

        // Labels are the source row index, so they identify pool membership
        let pool_labels: Vec<usize> = split.train_pool.labels.iter().map(|&l| l as usize).collect();
        assert_eq!(pool_labels, train);

        assert_folds_partition_pool(&split);
    }
}

#[test]
fn test_real_world_folds_are_contiguous() {
    let config = BenchmarkConfig::new("decision_tree")
        .with_dataset("diabetes")
        .with_random_state(0);
    let split = prepared_split(config, real_world(442, 3));

    // 221 pool rows: first fold holds 23, the rest 22
    assert_eq!(split.folds[0].validation_indices, (0..23).collect::<Vec<_>>());
    assert_eq!(split.folds[9].validation_indices, (199..221).collect::<Vec<_>>());
}

#[test]
fn test_real_world_split_seed_independent_of_random_state() {
    let rows = |seed| {
        let config = BenchmarkConfig::new("decision_tree")
            .with_dataset("diabetes")
            .with_random_state(seed);
        prepared_split(config, real_world(60, 3)).test_rows.unwrap()
    };
    assert_eq!(rows(1), rows(2));
}

#[test]
fn test_synthetic_folds_and_test_population() {
    let config = BenchmarkConfig::new("mlp")
        .with_dataset("artificialcos")
        .with_data_dimension(4)
        .with_random_state(9);
    let split = prepared_split(config, Arc::new(InMemorySource::new()));

    assert_eq!(split.train_pool.n_samples(), NUM_DATA);
    assert_folds_partition_pool(&split);
    for fold in &split.folds {
        assert!(fold
            .validation_indices
            .iter()
            .all(|i| i % CV_FOLDS == fold.fold_idx));
        assert_eq!(
            fold.train.labels,
            TargetFunction::Cos.labels(&fold.train.features)
        );
    }

    assert_eq!(split.test_set.features.dim(), (15000, 4));
    assert_eq!(
        split.test_set.labels,
        TargetFunction::Cos.labels(&split.test_set.features)
    );
    assert!(split.train_rows.is_none());
}

#[test]
fn test_synthetic_pool_labels_follow_label_switch() {
    let build = |consistent| {
        let config = BenchmarkConfig::new("decision_tree_depth")
            .with_dataset("artificialsquare")
            .with_data_dimension(2)
            .with_random_state(1)
            .with_consistent_training_labels(consistent);
        prepared_split(config, Arc::new(InMemorySource::new()))
    };

    let default = build(false);
    assert_eq!(
        default.train_pool.labels,
        TargetFunction::Sin.labels(&default.train_pool.features)
    );

    let consistent = build(true);
    assert_eq!(
        consistent.train_pool.labels,
        TargetFunction::Square.labels(&consistent.train_pool.features)
    );
    // The switch does not change the random stream
    assert_eq!(default.train_pool.features, consistent.train_pool.features);
    assert_eq!(default.test_set, consistent.test_set);
}

#[test]
fn test_different_seeds_shuffle_differently() {
    let build = |seed| {
        let config = BenchmarkConfig::new("decision_tree_depth")
            .with_data_dimension(2)
            .with_random_state(seed);
        prepared_split(config, Arc::new(InMemorySource::new()))
    };
    assert_ne!(build(1).train_pool, build(2).train_pool);
}
