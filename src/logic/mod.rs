//! Logic Module - Drift Detection Engines
//!
//! ## Architecture
//! - `features/` - Feature values, batches, extractor trait
//! - `cache/` - Per-monitor feature cache (memory + sqlite)
//! - `reference/` - Reference dataset loading, bucketing, clustering
//! - `stream/` - Streaming bucket assignment + trailing windows
//! - `drift/` - PSI, Earth-Mover cost, the drift latch
//! - `anomaly/` - Per-record scoring for retraining selection
//! - `monitor/` - The assembled `DataDriftMonitor` pipeline
//! - `alerts` - Webhook/log alert sink
//! - `telemetry` - JSONL metrics recorder

pub mod alerts;
pub mod anomaly;
pub mod cache;
pub mod drift;
pub mod features;
pub mod monitor;
pub mod reference;
pub mod stream;
pub mod telemetry;

pub use anomaly::{AnomalyReason, AnomalyScorer, AnomalyVerdict};
pub use cache::{FeatureCache, MemoryCache, SqliteCache};
pub use features::{Batch, ColumnExtractor, FeatureExtractor, FeatureKind, FeatureValue};
pub use monitor::{BatchReport, DataDriftMonitor, DriftMonitorConfig};
pub use reference::{ClusteringBackend, KMeans, ReferenceDataset, ReferenceScheme};
pub use stream::StreamingAssigner;
