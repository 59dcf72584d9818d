//! Drift Metrics Recorder
//!
//! Append-only JSONL writer for per-batch drift statistics, keyed by
//! (monitor name, sub-feature). One line per sub-feature per batch.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (20 MB)
const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// METRIC POINT
// ============================================================================

/// One drift measurement for one sub-feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: i64,
    pub monitor: String,
    pub sub_feature: String,
    /// Cumulative production records seen when measured
    pub records: u64,
    pub statistic: f64,
    pub drift: bool,
}

// ============================================================================
// RECORDER
// ============================================================================

/// Append-only JSONL metrics recorder with size-based rotation
pub struct MetricsRecorder {
    writer: BufWriter<File>,
    current_size: u64,
    base_dir: PathBuf,
}

impl MetricsRecorder {
    /// Create a new recorder in the given directory
    pub fn new(base_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(base_dir)?;
        let file = Self::open_new_file(base_dir)?;
        Ok(Self {
            writer: BufWriter::new(file),
            current_size: 0,
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Open a new log file with timestamp
    fn open_new_file(base_dir: &Path) -> std::io::Result<File> {
        let now = Utc::now();
        let filename = format!(
            "drift_metrics_{}_{:02}_{:02}_{:02}{:02}{:02}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            LOG_EXT
        );
        let file_path = base_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;
        log::info!("Opened drift metrics log: {:?}", file_path);
        Ok(file)
    }

    /// Record one metric point
    pub fn record(&mut self, point: &MetricPoint) -> std::io::Result<()> {
        let line = serde_json::to_string(point)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let bytes = line.as_bytes();

        if self.current_size + bytes.len() as u64 > MAX_FILE_SIZE {
            self.rotate()?;
        }

        self.writer.write_all(bytes)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.current_size += bytes.len() as u64 + 1;
        Ok(())
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        let file = Self::open_new_file(&self.base_dir)?;
        self.writer = BufWriter::new(file);
        self.current_size = 0;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_lines_are_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = MetricsRecorder::new(dir.path()).unwrap();

        for i in 0..3 {
            recorder
                .record(&MetricPoint {
                    timestamp: Utc::now().timestamp(),
                    monitor: "m".to_string(),
                    sub_feature: "f".to_string(),
                    records: 100 * i,
                    statistic: 0.1 * i as f64,
                    drift: i == 2,
                })
                .unwrap();
        }

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        let log_path = entries.next().unwrap().unwrap().path();
        let content = std::fs::read_to_string(log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let parsed: MetricPoint = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(parsed.records, 200);
        assert!(parsed.drift);
    }
}
