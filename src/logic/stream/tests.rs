use crate::error::DriftError;
use crate::logic::features::FeatureValue;
use crate::logic::reference::bucketer::{build, BucketerOptions};
use crate::logic::reference::KMeans;

use super::StreamingAssigner;

fn scalar_scheme(num_buckets: usize) -> crate::logic::reference::ReferenceScheme {
    let backend = KMeans::default();
    let values: Vec<FeatureValue> = (0..100).map(|i| FeatureValue::Scalar(i as f64)).collect();
    build(
        &values,
        &BucketerOptions {
            num_buckets,
            find_low_density_regions: false,
            backend: &backend,
        },
    )
    .unwrap()
}

fn categorical_scheme() -> crate::logic::reference::ReferenceScheme {
    let backend = KMeans::default();
    let values: Vec<FeatureValue> = ["a", "b", "a"]
        .iter()
        .map(|s| FeatureValue::Categorical(s.to_string()))
        .collect();
    build(
        &values,
        &BucketerOptions {
            num_buckets: 20,
            find_low_density_regions: false,
            backend: &backend,
        },
    )
    .unwrap()
}

#[test]
fn test_cumulative_counts_are_monotonic() {
    let mut scheme = scalar_scheme(4);
    let mut assigner = StreamingAssigner::new(scheme.num_buckets());

    let batch1: Vec<FeatureValue> = vec![
        FeatureValue::Scalar(10.0),
        FeatureValue::Scalar(60.0),
    ];
    let batch2: Vec<FeatureValue> = vec![FeatureValue::Scalar(10.0)];

    let a1 = assigner.assign_batch(&batch1, &mut scheme).unwrap();
    assert_eq!(a1, vec![0, 2]);
    let occ1 = assigner.trailing_occupancy(10);

    assigner.assign_batch(&batch2, &mut scheme).unwrap();
    let occ2 = assigner.trailing_occupancy(10);

    assert_eq!(assigner.records(), 3);
    // Bucket 0 occupancy grows, nothing shrinks below zero.
    assert!(occ2[0] > occ1[0] - 1e-9);
    assert!(occ2.iter().all(|&o| o >= 0.0));
}

#[test]
fn test_trailing_window_differences_snapshots() {
    let mut scheme = scalar_scheme(2);
    let mut assigner = StreamingAssigner::new(scheme.num_buckets());

    // 4 records in bucket 0, then 4 in bucket 1, window of 4.
    for _ in 0..4 {
        assigner
            .assign_batch(&[FeatureValue::Scalar(0.0)], &mut scheme)
            .unwrap();
    }
    for _ in 0..4 {
        assigner
            .assign_batch(&[FeatureValue::Scalar(90.0)], &mut scheme)
            .unwrap();
    }

    let occupancy = assigner.trailing_occupancy(4);
    assert!((occupancy[0] - 0.0).abs() < 1e-9);
    assert!((occupancy[1] - 1.0).abs() < 1e-9);
}

#[test]
fn test_window_clamped_at_stream_start() {
    let mut scheme = scalar_scheme(2);
    let mut assigner = StreamingAssigner::new(scheme.num_buckets());

    assigner
        .assign_batch(&[FeatureValue::Scalar(0.0)], &mut scheme)
        .unwrap();

    // Window far exceeds history: denominator is the records seen so far.
    let occupancy = assigner.trailing_occupancy(1000);
    assert!((occupancy[0] - 1.0).abs() < 1e-9);
    assert!((occupancy[1] - 0.0).abs() < 1e-9);
}

#[test]
fn test_wrong_width_vector_fails_without_partial_counts() {
    let backend = KMeans::default();
    let values: Vec<FeatureValue> = (0..20)
        .map(|i| FeatureValue::Vector(vec![i as f64, (20 - i) as f64]))
        .collect();
    let mut scheme = build(
        &values,
        &BucketerOptions {
            num_buckets: 2,
            find_low_density_regions: false,
            backend: &backend,
        },
    )
    .unwrap();
    let mut assigner = StreamingAssigner::new(scheme.num_buckets());

    // A well-formed value followed by a 1-dim value in the same batch.
    let batch = vec![
        FeatureValue::Vector(vec![1.0, 19.0]),
        FeatureValue::Vector(vec![1.0]),
    ];
    let result = assigner.assign_batch(&batch, &mut scheme);
    assert!(matches!(
        result,
        Err(DriftError::DimensionMismatch { expected: 2, actual: 1 })
    ));

    // The failed batch was not partially counted.
    assert_eq!(assigner.records(), 0);
    assert!(assigner.trailing_occupancy(10).iter().all(|&o| o == 0.0));
}

#[test]
fn test_unseen_category_appends_one_bucket() {
    let mut scheme = categorical_scheme();
    let mut assigner = StreamingAssigner::new(scheme.num_buckets());
    assert_eq!(scheme.num_buckets(), 2);

    let batch: Vec<FeatureValue> = vec![
        FeatureValue::Categorical("zebra".to_string()),
        FeatureValue::Categorical("zebra".to_string()),
    ];
    let assignments = assigner.assign_batch(&batch, &mut scheme).unwrap();

    // Exactly one new bucket; both records map to it.
    assert_eq!(scheme.num_buckets(), 3);
    assert_eq!(assignments, vec![2, 2]);

    // A later identical value maps to the same bucket without growth.
    let again = assigner
        .assign_batch(
            &[FeatureValue::Categorical("zebra".to_string())],
            &mut scheme,
        )
        .unwrap();
    assert_eq!(scheme.num_buckets(), 3);
    assert_eq!(again, vec![2]);
}
