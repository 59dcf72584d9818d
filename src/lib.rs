//! Driftwatch Core - Streaming Data Drift Detection Engine
//!
//! Detects distribution drift between a bucketed reference dataset and
//! a live production stream, and scores individual records for
//! retraining-dataset collection.
//!
//! ## Architecture
//! - `constants` - Tunables, thresholds, environment overrides
//! - `error` - The crate-wide `DriftError` type
//! - `logic` - Engines: features, cache, reference, stream, drift,
//!   anomaly, monitor, alerts, telemetry
//!
//! ## Quick start
//! ```no_run
//! use driftwatch_core::logic::{
//!     ColumnExtractor, DataDriftMonitor, DriftMonitorConfig, MemoryCache,
//! };
//!
//! # fn main() -> Result<(), driftwatch_core::error::DriftError> {
//! let mut monitor = DataDriftMonitor::setup(
//!     "prediction_drift",
//!     DriftMonitorConfig::default(),
//!     vec![Box::new(ColumnExtractor::new("score"))],
//!     std::path::Path::new("reference.csv"),
//!     Box::new(MemoryCache::new()),
//! )?;
//! # let batch = unimplemented!();
//! let report = monitor.check(&batch)?;
//! for sub in &report.sub_features {
//!     println!("{}: drift={} statistic={:?}", sub.label, sub.drift, sub.statistic);
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
pub mod logic;

pub use error::DriftError;
pub use logic::{Batch, DataDriftMonitor, DriftMonitorConfig};
