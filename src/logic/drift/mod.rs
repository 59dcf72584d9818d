//! Drift Module - divergence statistics and per-sub-feature state
//!
//! Two statistics compare trailing-window occupancy against reference
//! occupancy: PSI for scalar/categorical buckets and a greedy
//! approximate Earth-Mover cost for vector buckets. The greedy
//! transportation heuristic is deliberate - it is not an optimal
//! transport solve.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::constants::{EPSILON, PSI_OCCUPANCY_FLOOR};

// ============================================================================
// POPULATION STABILITY INDEX
// ============================================================================

/// PSI = sum_i (p_i - q_i) * ln(max(p_i, 1e-4) / q_i)
///
/// `prod` is the trailing-window occupancy, `reference` the scheme
/// occupancy. Zero reference mass (an appended categorical bucket) is
/// epsilon-guarded rather than raised; sparse buckets hit it routinely.
pub fn psi(prod: &[f64], reference: &[f64]) -> f64 {
    prod.iter()
        .zip(reference)
        .map(|(&p, &q)| (p - q) * (p.max(PSI_OCCUPANCY_FLOOR) / q.max(EPSILON)).ln())
        .sum()
}

// ============================================================================
// APPROXIMATE EARTH-MOVER COST
// ============================================================================

/// Greedy transportation estimate between two occupancy distributions
/// over the same centroids.
///
/// For each bucket with an imbalance, opposite-sign buckets are ranked
/// once by per-unit cost (L1 distance between centroids; same-sign
/// buckets get an effectively infinite cost) and filled cheapest-first
/// until the imbalance is exhausted.
pub fn earth_mover_cost(prod: &[f64], reference: &[f64], centroids: &[Vec<f64>]) -> f64 {
    const INCOMPATIBLE_COST: f64 = 1e9;

    let num_buckets = centroids.len();
    let mut total_cost = 0.0;

    for j in 0..num_buckets {
        let required = prod[j] - reference[j];

        let mut sources: Vec<(f64, f64)> = (0..num_buckets)
            .map(|k| {
                let transportable = if j == k { 0.0 } else { prod[k] - reference[k] };
                let supply = -transportable;
                let unit_cost = if supply * required < 0.0 {
                    INCOMPATIBLE_COST
                } else {
                    l1(&centroids[k], &centroids[j])
                };
                (supply.abs(), unit_cost)
            })
            .collect();
        sources.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut remaining = required.abs();
        for (supply, unit_cost) in sources {
            if remaining <= 0.0 {
                break;
            }
            let shipped = supply.min(remaining);
            total_cost += shipped * unit_cost;
            remaining -= shipped;
        }
    }
    total_cost
}

fn l1(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

// ============================================================================
// DRIFT STATE
// ============================================================================

/// Per sub-feature drift state with a rising-edge alert latch.
///
/// The latch fires once per excursion over the threshold and re-arms
/// when the statistic drops back under it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftState {
    pub last_statistic: Option<f64>,
    pub drifting: bool,
    latched: bool,
}

impl DriftState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly computed statistic. Returns true when an alert
    /// should fire for this batch.
    pub fn update(&mut self, statistic: f64, threshold: f64) -> bool {
        self.last_statistic = Some(statistic);
        self.drifting = statistic > threshold;

        if self.drifting && !self.latched {
            self.latched = true;
            return true;
        }
        if !self.drifting {
            self.latched = false;
        }
        false
    }
}
