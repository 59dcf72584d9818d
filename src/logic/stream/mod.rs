//! Stream Module - incremental nearest-bucket assignment
//!
//! Assigns every incoming record to its nearest reference bucket and
//! keeps monotonically growing cumulative per-bucket counts, one
//! snapshot per batch. Trailing-window occupancy falls out of
//! differencing two snapshots - history is never recomputed.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;
use crate::logic::features::FeatureValue;
use crate::logic::reference::scheme::{FixedScheme, ReferenceScheme};

// ============================================================================
// CUMULATIVE SNAPSHOTS
// ============================================================================

/// Cumulative per-bucket counts after some batch, plus the cumulative
/// record count at that point. Snapshots are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    counts: Vec<u64>,
    records: u64,
}

// ============================================================================
// STREAMING ASSIGNER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingAssigner {
    snapshots: Vec<Snapshot>,
    counts: Vec<u64>,
    records: u64,
}

impl StreamingAssigner {
    pub fn new(num_buckets: usize) -> Self {
        Self {
            // Zero snapshot so differencing is floor-clamped at stream start.
            snapshots: vec![Snapshot {
                counts: vec![0; num_buckets],
                records: 0,
            }],
            counts: vec![0; num_buckets],
            records: 0,
        }
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Assign a batch of values to buckets and push a new cumulative
    /// snapshot. Grows the count arrays when a categorical scheme
    /// appends a bucket.
    pub fn assign_batch(
        &mut self,
        values: &[FeatureValue],
        scheme: &mut ReferenceScheme,
    ) -> Result<Vec<usize>, DriftError> {
        // Reject malformed values up front so a failed batch leaves no
        // partial counts or appended buckets behind.
        for value in values {
            match scheme {
                ReferenceScheme::Fixed(FixedScheme::Scalar(_)) => {
                    value.as_scalar()?;
                }
                ReferenceScheme::Fixed(FixedScheme::Vector(s)) => {
                    let raw = value.as_vector()?;
                    if raw.len() != s.dims() {
                        return Err(DriftError::DimensionMismatch {
                            expected: s.dims(),
                            actual: raw.len(),
                        });
                    }
                }
                ReferenceScheme::GrowableCategorical(_) => {
                    value.as_categorical()?;
                }
            }
        }

        let mut assignments = Vec::with_capacity(values.len());
        for value in values {
            let bucket = match scheme {
                ReferenceScheme::Fixed(FixedScheme::Scalar(s)) => {
                    s.assign(value.as_scalar()?)
                }
                ReferenceScheme::Fixed(FixedScheme::Vector(s)) => {
                    s.assign(&s.normalize(value.as_vector()?))
                }
                ReferenceScheme::GrowableCategorical(s) => {
                    let (bucket, grew) = s.assign_or_grow(value.as_categorical()?);
                    if grew {
                        self.counts.push(0);
                        log::debug!("Appended categorical bucket {}", bucket);
                    }
                    bucket
                }
            };
            self.counts[bucket] += 1;
            assignments.push(bucket);
        }

        self.records += values.len() as u64;
        self.snapshots.push(Snapshot {
            counts: self.counts.clone(),
            records: self.records,
        });
        Ok(assignments)
    }

    /// Occupancy over the trailing `window` records: the difference
    /// between the newest snapshot and the newest one at least `window`
    /// records older, divided by the effective window size.
    pub fn trailing_occupancy(&self, window: u64) -> Vec<f64> {
        let latest = &self.snapshots[self.snapshots.len() - 1];
        let target = latest.records.saturating_sub(window);
        let base = self
            .snapshots
            .iter()
            .rev()
            .find(|s| s.records <= target)
            .unwrap_or(&self.snapshots[0]);

        // The base can sit farther back than `window` when one batch
        // overshoots it; normalize by the actual span so occupancy
        // always sums to one.
        let span = (latest.records - base.records).max(1) as f64;
        latest
            .counts
            .iter()
            .enumerate()
            .map(|(idx, &now)| {
                // Snapshots taken before a categorical bucket appeared
                // are shorter; missing entries count as zero.
                let then = base.counts.get(idx).copied().unwrap_or(0);
                (now - then) as f64 / span
            })
            .collect()
    }
}
