//! Reference bucketer - builds a scheme once per monitor
//!
//! Scalars get quantile ranges, categoricals one bucket per distinct
//! level, vectors centroid+variance clusters from the clustering
//! primitive. Runs once, synchronously, before streaming begins.

use crate::constants::LOW_DENSITY_FRACTION;
use crate::error::DriftError;
use crate::logic::features::{FeatureKind, FeatureValue};

use super::clustering::{l1_distance, ClusteringBackend};
use super::scheme::{
    CategoricalScheme, FixedScheme, ReferenceScheme, ScalarScheme, VectorScheme,
};

/// Options for scheme construction
pub struct BucketerOptions<'a> {
    pub num_buckets: usize,
    pub find_low_density_regions: bool,
    pub backend: &'a dyn ClusteringBackend,
}

/// Build the reference scheme for a column of extracted feature values.
///
/// Categorical data overrides `num_buckets` with the distinct level
/// count. Fails when the sample is empty or smaller than the requested
/// bucket count.
pub fn build(values: &[FeatureValue], opts: &BucketerOptions) -> Result<ReferenceScheme, DriftError> {
    let first = values.first().ok_or(DriftError::EmptyReference)?;
    match first.kind() {
        FeatureKind::Scalar => {
            let scalars: Vec<f64> = values
                .iter()
                .map(|v| v.as_scalar())
                .collect::<Result<_, _>>()?;
            Ok(ReferenceScheme::Fixed(FixedScheme::Scalar(build_scalar(
                &scalars,
                opts.num_buckets,
            )?)))
        }
        FeatureKind::Categorical => {
            let levels: Vec<&str> = values
                .iter()
                .map(|v| v.as_categorical())
                .collect::<Result<_, _>>()?;
            Ok(ReferenceScheme::GrowableCategorical(build_categorical(&levels)))
        }
        FeatureKind::Vector => {
            let vectors: Vec<&[f64]> = values
                .iter()
                .map(|v| v.as_vector())
                .collect::<Result<_, _>>()?;
            Ok(ReferenceScheme::Fixed(FixedScheme::Vector(build_vector(
                &vectors, opts,
            )?)))
        }
    }
}

// ============================================================================
// SCALAR PATH
// ============================================================================

fn build_scalar(values: &[f64], num_buckets: usize) -> Result<ScalarScheme, DriftError> {
    if num_buckets == 0 || num_buckets > values.len() {
        return Err(DriftError::InvalidBucketCount {
            requested: num_buckets,
            samples: values.len(),
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mut boundaries = Vec::with_capacity(num_buckets - 1);
    let mut means = Vec::with_capacity(num_buckets);
    let mut variances = Vec::with_capacity(num_buckets);
    let mut counts = Vec::with_capacity(num_buckets);

    for idx in 0..num_buckets {
        let start = idx * n / num_buckets;
        let end = if idx + 1 == num_buckets {
            n
        } else {
            (idx + 1) * n / num_buckets
        };
        if idx > 0 {
            boundaries.push(sorted[start]);
        }

        let slice = &sorted[start..end];
        let mean = slice.iter().sum::<f64>() / slice.len() as f64;
        let var = slice.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / slice.len() as f64;
        means.push(mean);
        variances.push(var);
        counts.push(slice.len() as u64);
    }

    Ok(ScalarScheme {
        boundaries,
        means,
        variances,
        counts,
        total: n as u64,
    })
}

// ============================================================================
// CATEGORICAL PATH
// ============================================================================

fn build_categorical(values: &[&str]) -> CategoricalScheme {
    let mut levels: Vec<String> = values.iter().map(|s| s.to_string()).collect();
    levels.sort();
    levels.dedup();

    let counts = levels
        .iter()
        .map(|level| values.iter().filter(|v| *v == level).count() as u64)
        .collect();

    CategoricalScheme {
        levels,
        counts,
        total: values.len() as u64,
    }
}

// ============================================================================
// VECTOR PATH
// ============================================================================

fn build_vector(vectors: &[&[f64]], opts: &BucketerOptions) -> Result<VectorScheme, DriftError> {
    let num_buckets = opts.num_buckets;
    if num_buckets == 0 || num_buckets > vectors.len() {
        return Err(DriftError::InvalidBucketCount {
            requested: num_buckets,
            samples: vectors.len(),
        });
    }

    let dim = vectors[0].len();
    let mut norm_factors = vec![0.0f64; dim];
    for vector in vectors {
        for (factor, value) in norm_factors.iter_mut().zip(*vector) {
            if value.abs() > *factor {
                *factor = value.abs();
            }
        }
    }
    for factor in norm_factors.iter_mut() {
        if *factor == 0.0 {
            *factor = 1.0;
        }
    }

    let normalized: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| v.iter().zip(&norm_factors).map(|(x, f)| x / f).collect())
        .collect();

    let fit = opts.backend.fit(&normalized, num_buckets)?;

    let mut counts = vec![0u64; num_buckets];
    for &label in &fit.labels {
        counts[label] += 1;
    }

    let mut variances = vec![0.0f64; num_buckets];
    for (point, &label) in normalized.iter().zip(&fit.labels) {
        variances[label] += l1_distance(point, &fit.centroids[label]);
    }
    for (var, &count) in variances.iter_mut().zip(&counts) {
        if count > 0 {
            *var /= count as f64;
        }
    }

    // Order buckets by descending reference membership.
    let mut order: Vec<usize> = (0..num_buckets).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));
    let relabel: Vec<usize> = {
        let mut relabel = vec![0usize; num_buckets];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            relabel[old_idx] = new_idx;
        }
        relabel
    };
    let centroids: Vec<Vec<f64>> = order.iter().map(|&i| fit.centroids[i].clone()).collect();
    let variances: Vec<f64> = order.iter().map(|&i| variances[i]).collect();
    let counts: Vec<u64> = order.iter().map(|&i| counts[i]).collect();
    let labels: Vec<usize> = fit.labels.iter().map(|&l| relabel[l]).collect();

    let low_density_points = if opts.find_low_density_regions {
        find_low_density_points(&normalized, &centroids, &variances, &labels)
    } else {
        Vec::new()
    };

    Ok(VectorScheme {
        centroids,
        variances,
        counts,
        total: vectors.len() as u64,
        norm_factors,
        low_density_points,
    })
}

/// Reference points with too few close neighbors.
///
/// Neighbor candidates come from clusters whose centroid lies within
/// 4x the minimum cluster variance (L1), then get filtered to a
/// 1.5x-minimum-variance radius; a point qualifies when that count
/// stays below 0.2% of the dataset size.
fn find_low_density_points(
    points: &[Vec<f64>],
    centroids: &[Vec<f64>],
    variances: &[f64],
    labels: &[usize],
) -> Vec<Vec<f64>> {
    let min_var = variances.iter().copied().fold(f64::MAX, f64::min);
    let threshold = (points.len() as f64 * LOW_DENSITY_FRACTION).ceil();

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    for (idx, &label) in labels.iter().enumerate() {
        members[label].push(idx);
    }

    let mut low_density = Vec::new();
    for point in points {
        let mut close_neighbors = 0usize;
        for (centroid, cluster_members) in centroids.iter().zip(&members) {
            if l1_distance(centroid, point) >= min_var * 4.0 {
                continue;
            }
            close_neighbors += cluster_members
                .iter()
                .filter(|&&m| l1_distance(&points[m], point) < 1.5 * min_var)
                .count();
        }
        // The point itself always matches once.
        if (close_neighbors.saturating_sub(1) as f64) < threshold {
            low_density.push(point.clone());
        }
    }
    low_density
}
