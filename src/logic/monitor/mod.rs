//! Monitor Module - the assembled drift detection pipeline
//!
//! One `DataDriftMonitor` owns everything for one monitored check:
//! the feature extractors, the injected cache, one reference scheme +
//! streaming assigner + drift state per sub-feature, the anomaly
//! scorers, and the alert/metrics collaborators.
//!
//! Processing is single-threaded and cooperative: `check` handles one
//! batch synchronously, end to end.


use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EMD_THRESHOLD, DEFAULT_INITIAL_SKIP, DEFAULT_NUM_BUCKETS, PSI_THRESHOLD,
};
use crate::error::DriftError;
use crate::logic::alerts::AlertSink;
use crate::logic::anomaly::{AnomalyReason, AnomalyScorer};
use crate::logic::cache::FeatureCache;
use crate::logic::drift::{earth_mover_cost, psi, DriftState};
use crate::logic::features::{extract_cached, Batch, FeatureExtractor, FeatureKind};
use crate::logic::reference::bucketer::{build, BucketerOptions};
use crate::logic::reference::{KMeans, ReferenceDataset, ReferenceScheme};
use crate::logic::stream::StreamingAssigner;
use crate::logic::telemetry::{MetricPoint, MetricsRecorder};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Monitor Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftMonitorConfig {
    /// Reference buckets per sub-feature (categoricals override this)
    pub num_buckets: usize,

    /// Production records to observe before computing statistics;
    /// also the trailing-window size
    pub initial_skip: u64,

    /// Earth-Mover cost threshold for vector sub-features.
    /// The PSI threshold is fixed at 0.3 and not configurable.
    pub emd_threshold: f64,

    /// Retain low-density reference points for anomaly scoring
    pub do_low_density_check: bool,

    /// Enable the drift-gated cluster-distance anomaly rule
    pub save_edge_cases: bool,

    /// Row indices into the reference dataset declared as outliers
    pub outlier_idxs: Vec<usize>,

    /// Explicit outlier points, in raw (unnormalized) feature space
    pub outlier_data: Vec<Vec<f64>>,

    /// Optional alert webhook
    pub webhook_url: Option<String>,

    /// Optional directory for the JSONL metrics log
    pub metrics_dir: Option<PathBuf>,
}

impl Default for DriftMonitorConfig {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            initial_skip: DEFAULT_INITIAL_SKIP,
            emd_threshold: DEFAULT_EMD_THRESHOLD,
            do_low_density_check: false,
            save_edge_cases: true,
            outlier_idxs: Vec::new(),
            outlier_data: Vec::new(),
            webhook_url: None,
            metrics_dir: None,
        }
    }
}

impl DriftMonitorConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self {
            num_buckets: crate::constants::get_num_buckets(),
            initial_skip: crate::constants::get_initial_skip(),
            emd_threshold: crate::constants::get_emd_threshold(),
            webhook_url: crate::constants::get_webhook_url(),
            ..Default::default()
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Drift outcome for one sub-feature after one batch
#[derive(Debug, Clone, Serialize)]
pub struct SubFeatureReport {
    pub label: String,
    /// None while still inside the initial skip
    pub statistic: Option<f64>,
    pub drift: bool,
    pub alerted: bool,
}

/// Retraining-selection outcome for one record
#[derive(Debug, Clone, Serialize)]
pub struct RecordSelection {
    pub id: String,
    pub selected: bool,
    pub reason: Option<AnomalyReason>,
}

/// Everything `check` produced for one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// True when the out-of-order guard dropped the batch
    pub skipped: bool,
    /// Cumulative production records after this batch
    pub records_seen: u64,
    pub sub_features: Vec<SubFeatureReport>,
    pub selections: Vec<RecordSelection>,
}

impl BatchReport {
    fn skipped(records_seen: u64) -> Self {
        Self {
            skipped: true,
            records_seen,
            sub_features: Vec::new(),
            selections: Vec::new(),
        }
    }
}

// ============================================================================
// SUB-FEATURE
// ============================================================================

/// One independently monitored feature: its own scheme, cumulative
/// counts, drift state and scorer.
struct SubFeature {
    extractor: Box<dyn FeatureExtractor>,
    scheme: ReferenceScheme,
    assigner: StreamingAssigner,
    state: DriftState,
    scorer: AnomalyScorer,
}

impl SubFeature {
    fn threshold(&self, config: &DriftMonitorConfig) -> f64 {
        match self.scheme.kind() {
            FeatureKind::Vector => config.emd_threshold,
            _ => PSI_THRESHOLD,
        }
    }

    fn statistic_name(&self) -> &'static str {
        match self.scheme.kind() {
            FeatureKind::Vector => "earth_mover_cost",
            _ => "psi",
        }
    }
}

// ============================================================================
// MONITOR
// ============================================================================

pub struct DataDriftMonitor {
    id: String,
    name: String,
    config: DriftMonitorConfig,
    cache: Box<dyn FeatureCache>,
    subs: Vec<SubFeature>,
    alerts: AlertSink,
    metrics: Option<MetricsRecorder>,
    /// Last observed count per aggregate key (out-of-order guard)
    seen_counts: HashMap<String, u64>,
    records_seen: u64,
}

impl DataDriftMonitor {
    /// Build the monitor from a reference dataset file. All failures
    /// here are fatal and synchronous - the monitor never starts in a
    /// half-built state.
    pub fn setup(
        name: &str,
        config: DriftMonitorConfig,
        extractors: Vec<Box<dyn FeatureExtractor>>,
        reference_path: &Path,
        cache: Box<dyn FeatureCache>,
    ) -> Result<Self, DriftError> {
        if extractors.is_empty() {
            return Err(DriftError::Other(
                "monitor needs at least one feature extractor".to_string(),
            ));
        }

        let dataset = ReferenceDataset::load(reference_path)?;
        let backend = KMeans::default();
        let opts = BucketerOptions {
            num_buckets: config.num_buckets,
            find_low_density_regions: config.do_low_density_check,
            backend: &backend,
        };

        let mut subs = Vec::with_capacity(extractors.len());
        for extractor in extractors {
            let values = extractor.compute_reference(&dataset)?;
            let scheme = build(&values, &opts)?;
            let scorer = AnomalyScorer::new(resolve_outliers(&config, &values, &scheme)?);
            let assigner = StreamingAssigner::new(scheme.num_buckets());
            log::info!(
                "Monitor '{}': sub-feature '{}' bucketed into {} {:?} buckets",
                name,
                extractor.name(),
                scheme.num_buckets(),
                scheme.kind()
            );
            subs.push(SubFeature {
                extractor,
                scheme,
                assigner,
                state: DriftState::new(),
                scorer,
            });
        }

        let metrics = match &config.metrics_dir {
            Some(dir) => Some(MetricsRecorder::new(dir)?),
            None => None,
        };
        let alerts = AlertSink::new(config.webhook_url.clone());

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            config,
            cache,
            subs,
            alerts,
            metrics,
            seen_counts: HashMap::new(),
            records_seen: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    /// Process one batch synchronously: extract (memoized), assign,
    /// snapshot, compute statistics, alert on rising edges, and score
    /// each record for retraining selection.
    pub fn check(&mut self, batch: &Batch) -> Result<BatchReport, DriftError> {
        if self.is_out_of_order(batch) {
            return Ok(BatchReport::skipped(self.records_seen));
        }

        self.records_seen += batch.len() as u64;

        let mut sub_reports = Vec::with_capacity(self.subs.len());
        let mut selections: Vec<RecordSelection> = batch
            .ids
            .iter()
            .map(|id| RecordSelection {
                id: id.clone(),
                selected: false,
                reason: None,
            })
            .collect();

        for sub in &mut self.subs {
            let values = extract_cached(self.cache.as_ref(), sub.extractor.as_ref(), batch)?;
            let assignments = sub.assigner.assign_batch(&values, &mut sub.scheme)?;

            // Statistics only after the initial skip; small windows give
            // spurious drift.
            let mut statistic = None;
            let mut alerted = false;
            if self.records_seen >= self.config.initial_skip {
                let prod = sub.assigner.trailing_occupancy(self.config.initial_skip);
                let reference = sub.scheme.reference_occupancy();
                let stat = match sub.scheme.as_vector() {
                    Some(vs) => earth_mover_cost(&prod, &reference, &vs.centroids),
                    None => psi(&prod, &reference),
                };
                alerted = sub.state.update(stat, sub.threshold(&self.config));
                statistic = Some(stat);

                if alerted {
                    let message = format!(
                        "Data drift last detected at {} with {} = {:.4}",
                        self.records_seen,
                        sub.statistic_name(),
                        stat
                    );
                    self.alerts.emit(&self.name, sub.extractor.name(), &message);
                }

                if let Some(recorder) = &mut self.metrics {
                    let point = MetricPoint {
                        timestamp: chrono::Utc::now().timestamp(),
                        monitor: self.name.clone(),
                        sub_feature: sub.extractor.name().to_string(),
                        records: self.records_seen,
                        statistic: stat,
                        drift: sub.state.drifting,
                    };
                    if let Err(e) = recorder.record(&point) {
                        log::warn!("Metrics write failed for '{}': {}", self.name, e);
                    }
                }
            }

            let verdicts = sub.scorer.score_batch(
                &sub.scheme,
                &values,
                &assignments,
                sub.state.drifting && self.config.save_edge_cases,
            )?;
            for (selection, verdict) in selections.iter_mut().zip(&verdicts) {
                // First triggered sub-feature wins; one reason per record.
                if verdict.is_anomalous && !selection.selected {
                    selection.selected = true;
                    selection.reason = verdict.reason;
                }
            }

            sub_reports.push(SubFeatureReport {
                label: sub.extractor.name().to_string(),
                statistic,
                drift: sub.state.drifting,
                alerted,
            });
        }

        Ok(BatchReport {
            skipped: false,
            records_seen: self.records_seen,
            sub_features: sub_reports,
            selections,
        })
    }

    /// Idempotence guard: a batch whose observed count for its
    /// aggregate key is <= a previously seen count is replayed or out
    /// of order, and silently skipped for that key.
    fn is_out_of_order(&mut self, batch: &Batch) -> bool {
        let (key, count) = match (&batch.aggregate_key, batch.observed_count) {
            (Some(key), Some(count)) => (key, count),
            _ => return false,
        };
        if let Some(&previous) = self.seen_counts.get(key) {
            if count <= previous {
                log::debug!(
                    "Skipping out-of-order batch for key '{}': count {} <= {}",
                    key,
                    count,
                    previous
                );
                return true;
            }
        }
        self.seen_counts.insert(key.clone(), count);
        false
    }
}

/// Scale declared outliers into the scheme's normalized space.
/// Only vector schemes carry outliers.
fn resolve_outliers(
    config: &DriftMonitorConfig,
    reference_values: &[crate::logic::features::FeatureValue],
    scheme: &ReferenceScheme,
) -> Result<Vec<Vec<f64>>, DriftError> {
    let vector_scheme = match scheme.as_vector() {
        Some(vs) => vs,
        None => return Ok(Vec::new()),
    };

    let mut outliers = Vec::with_capacity(config.outlier_idxs.len() + config.outlier_data.len());
    for &idx in &config.outlier_idxs {
        let value = reference_values.get(idx).ok_or_else(|| {
            DriftError::Other(format!(
                "outlier index {} out of range ({} reference rows)",
                idx,
                reference_values.len()
            ))
        })?;
        outliers.push(vector_scheme.normalize(value.as_vector()?));
    }
    for raw in &config.outlier_data {
        if raw.len() != vector_scheme.dims() {
            return Err(DriftError::DimensionMismatch {
                expected: vector_scheme.dims(),
                actual: raw.len(),
            });
        }
        outliers.push(vector_scheme.normalize(raw));
    }
    Ok(outliers)
}
