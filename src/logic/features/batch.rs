//! Production batch - one synchronous submission of logged records
//!
//! Construction validates array lengths up front: a ragged batch fails
//! the whole call, nothing is partially processed.

use std::collections::HashMap;

use crate::error::DriftError;
use crate::logic::features::FeatureValue;

/// A batch of equal-length named arrays plus a unique `id` array.
///
/// `aggregate_key`/`observed_count` carry the ordering metadata for the
/// out-of-order guard; batches without them are always processed.
#[derive(Debug, Clone)]
pub struct Batch {
    pub ids: Vec<String>,
    pub inputs: HashMap<String, Vec<FeatureValue>>,
    pub outputs: Option<Vec<FeatureValue>>,
    pub gts: Option<Vec<FeatureValue>>,
    pub aggregate_key: Option<String>,
    pub observed_count: Option<u64>,
}

impl Batch {
    pub fn new(
        ids: Vec<String>,
        inputs: HashMap<String, Vec<FeatureValue>>,
    ) -> Result<Self, DriftError> {
        let batch = Self {
            ids,
            inputs,
            outputs: None,
            gts: None,
            aggregate_key: None,
            observed_count: None,
        };
        batch.validate()?;
        Ok(batch)
    }

    pub fn with_outputs(mut self, outputs: Vec<FeatureValue>) -> Result<Self, DriftError> {
        self.outputs = Some(outputs);
        self.validate()?;
        Ok(self)
    }

    pub fn with_gts(mut self, gts: Vec<FeatureValue>) -> Result<Self, DriftError> {
        self.gts = Some(gts);
        self.validate()?;
        Ok(self)
    }

    pub fn with_ordering(mut self, aggregate_key: &str, observed_count: u64) -> Self {
        self.aggregate_key = Some(aggregate_key.to_string());
        self.observed_count = Some(observed_count);
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn validate(&self) -> Result<(), DriftError> {
        let expected = self.ids.len();
        for (name, column) in &self.inputs {
            if column.len() != expected {
                return Err(DriftError::RaggedBatch {
                    column: name.clone(),
                    expected,
                    actual: column.len(),
                });
            }
        }
        if let Some(outputs) = &self.outputs {
            if outputs.len() != expected {
                return Err(DriftError::RaggedBatch {
                    column: "output".to_string(),
                    expected,
                    actual: outputs.len(),
                });
            }
        }
        if let Some(gts) = &self.gts {
            if gts.len() != expected {
                return Err(DriftError::RaggedBatch {
                    column: "gt".to_string(),
                    expected,
                    actual: gts.len(),
                });
            }
        }
        Ok(())
    }
}
