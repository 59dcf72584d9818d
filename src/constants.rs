//! Central Configuration Constants
//!
//! Single source of truth for all monitor defaults.
//! To change a default threshold, only edit this file.

/// Default number of reference buckets per sub-feature
pub const DEFAULT_NUM_BUCKETS: usize = 20;

/// Default number of production records to observe before computing statistics
pub const DEFAULT_INITIAL_SKIP: u64 = 2000;

/// Default Earth-Mover cost threshold for vector features
pub const DEFAULT_EMD_THRESHOLD: f64 = 1.0;

/// PSI threshold for scalar/categorical features (fixed, not configurable)
pub const PSI_THRESHOLD: f64 = 0.3;

/// Floor applied to production occupancy inside the PSI log term
pub const PSI_OCCUPANCY_FLOOR: f64 = 1e-4;

/// Guard for near-zero denominators (variances, reference occupancy)
pub const EPSILON: f64 = 1e-9;

/// Distance below which a record counts as an exact user outlier
pub const EXACT_OUTLIER_TOLERANCE: f64 = 1e-7;

/// Fraction of the reference set below which a point sits in a low-density region
pub const LOW_DENSITY_FRACTION: f64 = 0.002;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Driftwatch";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get bucket count from environment or use default
pub fn get_num_buckets() -> usize {
    std::env::var("DRIFTWATCH_NUM_BUCKETS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_NUM_BUCKETS)
}

/// Get initial skip from environment or use default
pub fn get_initial_skip() -> u64 {
    std::env::var("DRIFTWATCH_INITIAL_SKIP")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_INITIAL_SKIP)
}

/// Get EMD threshold from environment or use default
pub fn get_emd_threshold() -> f64 {
    std::env::var("DRIFTWATCH_EMD_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_EMD_THRESHOLD)
}

/// Get alert webhook URL from environment, if set
pub fn get_webhook_url() -> Option<String> {
    std::env::var("DRIFTWATCH_WEBHOOK_URL").ok()
}
