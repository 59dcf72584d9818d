//! In-memory cache backend
//!
//! One `HashMap` per feature name behind a `parking_lot::Mutex`.
//! Lifetime = monitor process lifetime.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::DriftError;
use crate::logic::features::FeatureValue;

use super::FeatureCache;

#[derive(Default)]
pub struct MemoryCache {
    stores: Mutex<HashMap<String, HashMap<String, FeatureValue>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries cached for a feature
    pub fn len(&self, feature: &str) -> usize {
        self.stores
            .lock()
            .get(feature)
            .map(|store| store.len())
            .unwrap_or(0)
    }
}

impl FeatureCache for MemoryCache {
    fn fetch(&self, feature: &str, ids: &[String]) -> Result<Vec<Option<FeatureValue>>, DriftError> {
        let stores = self.stores.lock();
        let store = stores.get(feature);
        Ok(ids
            .iter()
            .map(|id| store.and_then(|s| s.get(id).cloned()))
            .collect())
    }

    fn upsert(&self, feature: &str, ids: &[String], values: &[FeatureValue]) -> Result<(), DriftError> {
        let mut stores = self.stores.lock();
        let store = stores.entry(feature.to_string()).or_default();
        for (id, value) in ids.iter().zip(values) {
            store.insert(id.clone(), value.clone());
        }
        Ok(())
    }
}
