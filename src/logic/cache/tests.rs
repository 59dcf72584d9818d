use std::cell::RefCell;

use super::memory::MemoryCache;
use super::sqlite::SqliteCache;
use super::{get_or_compute, FeatureCache};
use crate::logic::features::FeatureValue;

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn scalars(vals: &[f64]) -> Vec<FeatureValue> {
    vals.iter().map(|&v| FeatureValue::Scalar(v)).collect()
}

#[test]
fn test_get_or_compute_skips_cached_ids() {
    let cache = MemoryCache::new();
    let computed_ids: RefCell<Vec<String>> = RefCell::new(Vec::new());

    let first = get_or_compute(&cache, "feat", &ids(&["a", "b", "c"]), |uncached| {
        computed_ids.borrow_mut().extend(uncached.iter().cloned());
        Ok(scalars(&[1.0, 2.0, 3.0]))
    })
    .unwrap();
    assert_eq!(first, scalars(&[1.0, 2.0, 3.0]));
    assert_eq!(*computed_ids.borrow(), ids(&["a", "b", "c"]));
    assert_eq!(cache.len("feat"), 3);

    computed_ids.borrow_mut().clear();

    // Overlapping second call: only the net-new id is computed.
    let second = get_or_compute(&cache, "feat", &ids(&["b", "c", "d"]), |uncached| {
        computed_ids.borrow_mut().extend(uncached.iter().cloned());
        Ok(scalars(&[4.0]))
    })
    .unwrap();
    assert_eq!(second, scalars(&[2.0, 3.0, 4.0]));
    assert_eq!(*computed_ids.borrow(), ids(&["d"]));
    assert_eq!(cache.len("feat"), 4);
}

#[test]
fn test_get_or_compute_fully_cached_never_computes() {
    let cache = MemoryCache::new();
    cache
        .upsert("feat", &ids(&["x", "y"]), &scalars(&[7.0, 8.0]))
        .unwrap();

    let out = get_or_compute(&cache, "feat", &ids(&["y", "x"]), |_| {
        panic!("compute_fn must not run when all ids are cached")
    })
    .unwrap();
    assert_eq!(out, scalars(&[8.0, 7.0]));
}

#[test]
fn test_features_are_isolated() {
    let cache = MemoryCache::new();
    cache.upsert("a", &ids(&["1"]), &scalars(&[1.0])).unwrap();

    let misses = cache.fetch("b", &ids(&["1"])).unwrap();
    assert_eq!(misses, vec![None]);
}

#[test]
fn test_sqlite_round_trips_all_value_kinds() {
    let cache = SqliteCache::open_in_memory().unwrap();
    let values = vec![
        FeatureValue::Scalar(1.5),
        FeatureValue::Categorical("cat".to_string()),
        FeatureValue::Vector(vec![0.1, -0.2, 0.3]),
    ];
    cache.upsert("feat", &ids(&["a", "b", "c"]), &values).unwrap();

    let fetched = cache.fetch("feat", &ids(&["a", "b", "c", "d"])).unwrap();
    assert_eq!(fetched[0].as_ref(), Some(&values[0]));
    assert_eq!(fetched[1].as_ref(), Some(&values[1]));
    assert_eq!(fetched[2].as_ref(), Some(&values[2]));
    assert_eq!(fetched[3], None);
}

#[test]
fn test_sqlite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let cache = SqliteCache::open(&path).unwrap();
        cache.upsert("feat", &ids(&["a"]), &scalars(&[42.0])).unwrap();
    }

    let cache = SqliteCache::open(&path).unwrap();
    let fetched = cache.fetch("feat", &ids(&["a"])).unwrap();
    assert_eq!(fetched[0], Some(FeatureValue::Scalar(42.0)));
}
