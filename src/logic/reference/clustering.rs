//! Clustering primitive
//!
//! Reference-time vector bucketing runs through the `ClusteringBackend`
//! seam so the algorithm stays swappable. The shipped backend is a seeded
//! k-means (k-means++ initialization, capped Lloyd iterations) so that a
//! given reference set always produces the same scheme.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::DriftError;

// ============================================================================
// BACKEND SEAM
// ============================================================================

pub struct ClusterFit {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

pub trait ClusteringBackend {
    fn fit(&self, points: &[Vec<f64>], k: usize) -> Result<ClusterFit, DriftError>;
}

// ============================================================================
// SEEDED K-MEANS
// ============================================================================

pub struct KMeans {
    pub max_iters: usize,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iters: 100,
            seed: 1,
        }
    }
}

impl ClusteringBackend for KMeans {
    fn fit(&self, points: &[Vec<f64>], k: usize) -> Result<ClusterFit, DriftError> {
        if points.len() < k {
            return Err(DriftError::InvalidBucketCount {
                requested: k,
                samples: points.len(),
            });
        }
        if k == 0 {
            return Err(DriftError::Other("cannot fit 0 clusters".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = init_plus_plus(points, k, &mut rng);
        let mut labels = vec![0usize; points.len()];

        for _ in 0..self.max_iters {
            let mut moved = false;
            for (i, point) in points.iter().enumerate() {
                let nearest = nearest_centroid(point, &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    moved = true;
                }
            }

            let dim = points[0].len();
            let mut sums = vec![vec![0.0f64; dim]; k];
            let mut counts = vec![0usize; k];
            for (point, &label) in points.iter().zip(&labels) {
                counts[label] += 1;
                for (acc, value) in sums[label].iter_mut().zip(point) {
                    *acc += value;
                }
            }
            for idx in 0..k {
                // A cluster that lost all members keeps its centroid.
                if counts[idx] > 0 {
                    for acc in sums[idx].iter_mut() {
                        *acc /= counts[idx] as f64;
                    }
                    centroids[idx] = sums[idx].clone();
                }
            }

            if !moved {
                break;
            }
        }

        Ok(ClusterFit { centroids, labels })
    }
}

/// k-means++ seeding: each next centroid is sampled with probability
/// proportional to its squared distance from the nearest existing one.
fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    let mut min_sq_dists = vec![f64::MAX; points.len()];
    while centroids.len() < k {
        let last = &centroids[centroids.len() - 1];
        for (i, point) in points.iter().enumerate() {
            let d = sq_euclidean(point, last);
            if d < min_sq_dists[i] {
                min_sq_dists[i] = d;
            }
        }

        let total: f64 = min_sq_dists.iter().sum();
        if total <= 0.0 {
            // All remaining points coincide with a centroid.
            centroids.push(points[rng.gen_range(0..points.len())].clone());
            continue;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (i, d) in min_sq_dists.iter().enumerate() {
            target -= d;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(points[chosen].clone());
    }
    centroids
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (idx, centroid) in centroids.iter().enumerate() {
        let d = sq_euclidean(point, centroid);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Summed absolute difference, the distance used everywhere downstream
/// of clustering (assignment, variance, anomaly scoring).
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
