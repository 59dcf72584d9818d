//! Anomaly Module - per-record scoring against the reference scheme
//!
//! Flags records far from all reference clusters, near low-density
//! reference regions, or near user-declared outliers. Flagged records
//! are candidates for the surrounding retraining-dataset collector.
//!
//! Rule precedence is fixed: cluster distance, then low density, then
//! user outliers. At most one reason per record.


use serde::{Deserialize, Serialize};

use crate::constants::{EPSILON, EXACT_OUTLIER_TOLERANCE};
use crate::error::DriftError;
use crate::logic::features::FeatureValue;
use crate::logic::reference::clustering::l1_distance;
use crate::logic::reference::scheme::{ReferenceScheme, VectorScheme};

// ============================================================================
// REASON CODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyReason {
    AwayFromAllClusters,
    NearLowDensityRegion,
    NearUserOutlier,
    ExactUserOutlier,
}

impl AnomalyReason {
    pub fn code(&self) -> &'static str {
        match self {
            AnomalyReason::AwayFromAllClusters => "AWAY_FROM_ALL_CLUSTERS",
            AnomalyReason::NearLowDensityRegion => "NEAR_LOW_DENSITY_REGION",
            AnomalyReason::NearUserOutlier => "NEAR_USER_OUTLIER",
            AnomalyReason::ExactUserOutlier => "EXACT_USER_OUTLIER",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AnomalyReason::AwayFromAllClusters => "Far from every reference cluster",
            AnomalyReason::NearLowDensityRegion => {
                "Lies near a low-density region of the reference distribution"
            }
            AnomalyReason::NearUserOutlier => "Close to a user-declared outlier",
            AnomalyReason::ExactUserOutlier => "Matches a user-declared outlier",
        }
    }
}

/// Ephemeral per-record verdict for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub is_anomalous: bool,
    pub reason: Option<AnomalyReason>,
}

impl AnomalyVerdict {
    fn clear() -> Self {
        Self {
            is_anomalous: false,
            reason: None,
        }
    }

    fn flag(reason: AnomalyReason) -> Self {
        Self {
            is_anomalous: true,
            reason: Some(reason),
        }
    }
}

// ============================================================================
// SCORER
// ============================================================================

/// Scores records of one sub-feature against its scheme.
///
/// `outliers` are user-declared points already scaled into the scheme's
/// normalized space.
pub struct AnomalyScorer {
    outliers: Vec<Vec<f64>>,
}

impl AnomalyScorer {
    pub fn new(outliers: Vec<Vec<f64>>) -> Self {
        Self { outliers }
    }

    /// Score one batch. `drift_flag` gates the cluster-distance rule:
    /// far-from-cluster records only matter while the monitor is
    /// observing drift.
    pub fn score_batch(
        &self,
        scheme: &ReferenceScheme,
        values: &[FeatureValue],
        assignments: &[usize],
        drift_flag: bool,
    ) -> Result<Vec<AnomalyVerdict>, DriftError> {
        let vector_scheme = match scheme.as_vector() {
            Some(s) => s,
            // Cluster-distance, low-density and outlier rules all need
            // vector buckets; scalar/categorical records are never
            // anomalous here.
            None => return Ok(vec![AnomalyVerdict::clear(); values.len()]),
        };

        values
            .iter()
            .zip(assignments)
            .map(|(value, &bucket)| {
                let normalized = vector_scheme.normalize(value.as_vector()?);
                Ok(self.score_one(vector_scheme, &normalized, bucket, drift_flag))
            })
            .collect()
    }

    fn score_one(
        &self,
        scheme: &VectorScheme,
        normalized: &[f64],
        bucket: usize,
        drift_flag: bool,
    ) -> AnomalyVerdict {
        if drift_flag {
            let assigned_dist = normalized_distance(scheme, normalized, bucket);
            if assigned_dist > 2.0 {
                let min_dist = (0..scheme.centroids.len())
                    .map(|idx| normalized_distance(scheme, normalized, idx))
                    .fold(f64::MAX, f64::min);
                if min_dist > 1.0 {
                    return AnomalyVerdict::flag(AnomalyReason::AwayFromAllClusters);
                }
            }
        }

        let min_var = scheme.min_variance();
        if !scheme.low_density_points.is_empty() {
            let nearest = nearest_l1(normalized, &scheme.low_density_points);
            if nearest < min_var {
                return AnomalyVerdict::flag(AnomalyReason::NearLowDensityRegion);
            }
        }

        if !self.outliers.is_empty() {
            let nearest = nearest_l1(normalized, &self.outliers);
            if nearest < 0.5 * min_var {
                if nearest < EXACT_OUTLIER_TOLERANCE {
                    return AnomalyVerdict::flag(AnomalyReason::ExactUserOutlier);
                }
                return AnomalyVerdict::flag(AnomalyReason::NearUserOutlier);
            }
        }

        AnomalyVerdict::clear()
    }
}

/// L1 distance to the bucket centroid, scaled by the bucket's variance
fn normalized_distance(scheme: &VectorScheme, normalized: &[f64], bucket: usize) -> f64 {
    l1_distance(normalized, &scheme.centroids[bucket]) / scheme.variances[bucket].max(EPSILON)
}

fn nearest_l1(point: &[f64], candidates: &[Vec<f64>]) -> f64 {
    candidates
        .iter()
        .map(|c| l1_distance(point, c))
        .fold(f64::MAX, f64::min)
}
