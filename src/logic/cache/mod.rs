//! Cache Module - per-monitor feature value store
//!
//! Maps (feature name, record id) to a computed value so repeated passes
//! over the stream never recompute a feature. The cache is owned by (or
//! injected into) one monitor instance - never ambient global state.
//!
//! # Backends
//! - `memory.rs`: process-lifetime `HashMap` store
//! - `sqlite.rs`: durable store scoped to the monitor

pub mod memory;
pub mod sqlite;

#[cfg(test)]
mod tests;

use crate::error::DriftError;
use crate::logic::features::FeatureValue;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

// ============================================================================
// CACHE TRAIT
// ============================================================================

/// Keyed store of computed feature values.
///
/// `fetch` and `upsert` take parallel id/value slices; implementations
/// must return fetched values in the order the ids were requested.
pub trait FeatureCache {
    fn fetch(&self, feature: &str, ids: &[String]) -> Result<Vec<Option<FeatureValue>>, DriftError>;

    fn upsert(&self, feature: &str, ids: &[String], values: &[FeatureValue]) -> Result<(), DriftError>;
}

// ============================================================================
// GET-OR-COMPUTE
// ============================================================================

/// Split `ids` into cached/uncached, invoke `compute_fn` only on the
/// uncached subset, merge preserving batch order, and write the computed
/// values back before returning.
pub fn get_or_compute<F>(
    cache: &dyn FeatureCache,
    feature: &str,
    ids: &[String],
    compute_fn: F,
) -> Result<Vec<FeatureValue>, DriftError>
where
    F: FnOnce(&[String]) -> Result<Vec<FeatureValue>, DriftError>,
{
    let cached = cache.fetch(feature, ids)?;

    let uncached_ids: Vec<String> = ids
        .iter()
        .zip(&cached)
        .filter(|(_, hit)| hit.is_none())
        .map(|(id, _)| id.clone())
        .collect();

    if uncached_ids.is_empty() {
        return Ok(cached.into_iter().flatten().collect());
    }

    let computed = compute_fn(&uncached_ids)?;
    if computed.len() != uncached_ids.len() {
        return Err(DriftError::Other(format!(
            "compute_fn for '{}' returned {} values for {} ids",
            feature,
            computed.len(),
            uncached_ids.len()
        )));
    }
    cache.upsert(feature, &uncached_ids, &computed)?;

    // Merge: cached hits keep their slot, computed values fill the misses
    // in order.
    let mut fresh = computed.into_iter();
    let mut merged = Vec::with_capacity(ids.len());
    for hit in cached {
        match hit {
            Some(value) => merged.push(value),
            None => merged.push(fresh.next().ok_or_else(|| {
                DriftError::Other("compute_fn produced fewer values than requested".to_string())
            })?),
        }
    }
    Ok(merged)
}
