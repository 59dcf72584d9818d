//! Features Module - Feature Extraction Engine
//!
//! Computes one named value per record from a batch (or from the
//! reference dataset at setup). Extraction over the production stream
//! is memoized per record id through the cache layer.

pub mod batch;


use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;
use crate::logic::cache::{get_or_compute, FeatureCache};
use crate::logic::reference::dataset::ReferenceDataset;

pub use batch::Batch;

// ============================================================================
// FEATURE VALUES
// ============================================================================

/// The shape of a monitored feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Scalar,
    Categorical,
    Vector,
}

/// One computed feature value for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Scalar(f64),
    Categorical(String),
    Vector(Vec<f64>),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Scalar(_) => FeatureKind::Scalar,
            FeatureValue::Categorical(_) => FeatureKind::Categorical,
            FeatureValue::Vector(_) => FeatureKind::Vector,
        }
    }

    pub fn as_scalar(&self) -> Result<f64, DriftError> {
        match self {
            FeatureValue::Scalar(v) => Ok(*v),
            other => Err(DriftError::KindMismatch {
                expected: FeatureKind::Scalar,
                actual: other.kind(),
            }),
        }
    }

    pub fn as_categorical(&self) -> Result<&str, DriftError> {
        match self {
            FeatureValue::Categorical(v) => Ok(v),
            other => Err(DriftError::KindMismatch {
                expected: FeatureKind::Categorical,
                actual: other.kind(),
            }),
        }
    }

    pub fn as_vector(&self) -> Result<&[f64], DriftError> {
        match self {
            FeatureValue::Vector(v) => Ok(v),
            other => Err(DriftError::KindMismatch {
                expected: FeatureKind::Vector,
                actual: other.kind(),
            }),
        }
    }
}

// ============================================================================
// FEATURE EXTRACTOR
// ============================================================================

/// Pure per-record feature computation.
///
/// Implementations must be deterministic: the cache layer assumes that a
/// (feature name, record id) pair always maps to the same value.
pub trait FeatureExtractor {
    /// Cache key prefix and sub-feature label
    fn name(&self) -> &str;

    /// Compute values for the given row indices of a batch
    fn compute_rows(&self, batch: &Batch, rows: &[usize]) -> Result<Vec<FeatureValue>, DriftError>;

    /// Compute values for every row of the reference dataset
    fn compute_reference(&self, dataset: &ReferenceDataset) -> Result<Vec<FeatureValue>, DriftError>;
}

/// Extractor that copies a named input column verbatim
pub struct ColumnExtractor {
    column: String,
}

impl ColumnExtractor {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }
}

impl FeatureExtractor for ColumnExtractor {
    fn name(&self) -> &str {
        &self.column
    }

    fn compute_rows(&self, batch: &Batch, rows: &[usize]) -> Result<Vec<FeatureValue>, DriftError> {
        let column = batch
            .inputs
            .get(&self.column)
            .ok_or_else(|| DriftError::MissingColumn(self.column.clone()))?;
        Ok(rows.iter().map(|&i| column[i].clone()).collect())
    }

    fn compute_reference(&self, dataset: &ReferenceDataset) -> Result<Vec<FeatureValue>, DriftError> {
        dataset
            .column(&self.column)
            .map(|col| col.to_vec())
            .ok_or_else(|| DriftError::MissingColumn(self.column.clone()))
    }
}

// ============================================================================
// MEMOIZED EXTRACTION
// ============================================================================

/// Extract the feature for every record of a batch, computing only the
/// records whose ids are not yet in the cache.
pub fn extract_cached(
    cache: &dyn FeatureCache,
    extractor: &dyn FeatureExtractor,
    batch: &Batch,
) -> Result<Vec<FeatureValue>, DriftError> {
    let row_of_id: HashMap<&str, usize> = batch
        .ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    get_or_compute(cache, extractor.name(), &batch.ids, |uncached_ids| {
        let rows: Vec<usize> = uncached_ids.iter().map(|id| row_of_id[id.as_str()]).collect();
        extractor.compute_rows(batch, &rows)
    })
}
