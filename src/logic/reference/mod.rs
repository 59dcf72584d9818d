//! Reference Module - static baseline of the monitored distribution
//!
//! Built once at setup: load the reference file, extract the feature,
//! partition its value space into buckets with normalized occupancy.
//!
//! # Architecture
//! - `dataset.rs`: reference file loading (csv/json)
//! - `clustering.rs`: swappable clustering primitive (seeded k-means)
//! - `scheme.rs`: `ReferenceScheme` - `Fixed` vs `GrowableCategorical`
//! - `bucketer.rs`: scheme construction

pub mod bucketer;
pub mod clustering;
pub mod dataset;
pub mod scheme;


pub use bucketer::{build, BucketerOptions};
pub use clustering::{ClusterFit, ClusteringBackend, KMeans};
pub use dataset::ReferenceDataset;
pub use scheme::{CategoricalScheme, FixedScheme, ReferenceScheme, ScalarScheme, VectorScheme};
