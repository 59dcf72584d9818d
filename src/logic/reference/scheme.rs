//! Reference bucket schemes
//!
//! A scheme partitions a feature's value space into buckets with
//! reference occupancy fractions. Bucket count is fixed for the monitor
//! lifetime except for categorical schemes, which may grow when the
//! stream produces an unseen level - hence the tagged split between
//! `Fixed` and `GrowableCategorical` instead of mutating a nominally
//! fixed array in place.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::logic::features::FeatureKind;

use super::clustering::l1_distance;

// ============================================================================
// SCHEME VARIANTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReferenceScheme {
    Fixed(FixedScheme),
    GrowableCategorical(CategoricalScheme),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FixedScheme {
    Scalar(ScalarScheme),
    Vector(VectorScheme),
}

impl ReferenceScheme {
    pub fn kind(&self) -> FeatureKind {
        match self {
            ReferenceScheme::Fixed(FixedScheme::Scalar(_)) => FeatureKind::Scalar,
            ReferenceScheme::Fixed(FixedScheme::Vector(_)) => FeatureKind::Vector,
            ReferenceScheme::GrowableCategorical(_) => FeatureKind::Categorical,
        }
    }

    pub fn num_buckets(&self) -> usize {
        match self {
            ReferenceScheme::Fixed(FixedScheme::Scalar(s)) => s.counts.len(),
            ReferenceScheme::Fixed(FixedScheme::Vector(s)) => s.counts.len(),
            ReferenceScheme::GrowableCategorical(s) => s.levels.len(),
        }
    }

    /// Normalized reference frequencies, one per bucket. Appended
    /// categorical buckets carry zero reference mass.
    pub fn reference_occupancy(&self) -> Vec<f64> {
        let (counts, total) = match self {
            ReferenceScheme::Fixed(FixedScheme::Scalar(s)) => (&s.counts, s.total),
            ReferenceScheme::Fixed(FixedScheme::Vector(s)) => (&s.counts, s.total),
            ReferenceScheme::GrowableCategorical(s) => (&s.counts, s.total),
        };
        counts
            .iter()
            .map(|&c| c as f64 / total.max(1) as f64)
            .collect()
    }

    pub fn as_vector(&self) -> Option<&VectorScheme> {
        match self {
            ReferenceScheme::Fixed(FixedScheme::Vector(s)) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// SCALAR SCHEME
// ============================================================================

/// Contiguous quantile ranges over a sorted reference sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarScheme {
    /// Split values, one fewer than the bucket count
    pub boundaries: Vec<f64>,
    /// Per-bucket slice mean
    pub means: Vec<f64>,
    /// Per-bucket slice variance
    pub variances: Vec<f64>,
    pub counts: Vec<u64>,
    pub total: u64,
}

impl ScalarScheme {
    /// Bucket id by binary search against the sorted boundaries
    pub fn assign(&self, value: f64) -> usize {
        self.boundaries.partition_point(|b| *b < value)
    }
}

// ============================================================================
// CATEGORICAL SCHEME
// ============================================================================

/// One bucket per distinct observed level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalScheme {
    pub levels: Vec<String>,
    pub counts: Vec<u64>,
    pub total: u64,
}

impl CategoricalScheme {
    /// Bucket id of the level, appending a new bucket for an unseen one.
    /// Returns (bucket id, whether a bucket was appended).
    pub fn assign_or_grow(&mut self, level: &str) -> (usize, bool) {
        if let Some(idx) = self.levels.iter().position(|l| l == level) {
            return (idx, false);
        }
        self.levels.push(level.to_string());
        self.counts.push(0);
        (self.levels.len() - 1, true)
    }
}

// ============================================================================
// VECTOR SCHEME
// ============================================================================

/// Centroid + variance clusters over normalized embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorScheme {
    /// Cluster centroids in normalized space, ordered by descending
    /// reference member count
    pub centroids: Vec<Vec<f64>>,
    /// Mean L1 deviation of members from their centroid
    pub variances: Vec<f64>,
    pub counts: Vec<u64>,
    pub total: u64,
    /// Per-dimension max |value| over the reference set
    pub norm_factors: Vec<f64>,
    /// Reference points from low-density regions, kept for anomaly scoring
    pub low_density_points: Vec<Vec<f64>>,
}

impl VectorScheme {
    /// Dimensionality the scheme was built with
    pub fn dims(&self) -> usize {
        self.norm_factors.len()
    }

    /// Scale a raw vector into the scheme's normalized space
    pub fn normalize(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(&self.norm_factors)
            .map(|(v, f)| v / f)
            .collect()
    }

    /// Bucket id = centroid minimizing summed L1 distance to the
    /// (already normalized) input
    pub fn assign(&self, normalized: &[f64]) -> usize {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for (idx, centroid) in self.centroids.iter().enumerate() {
            let d = l1_distance(normalized, centroid);
            if d < best_dist {
                best_dist = d;
                best = idx;
            }
        }
        best
    }

    pub fn min_variance(&self) -> f64 {
        self.variances
            .iter()
            .copied()
            .fold(f64::MAX, f64::min)
            .max(EPSILON)
    }
}
