use crate::logic::features::FeatureKind;

#[derive(Debug)]
pub enum DriftError {
    IoError(std::io::Error),
    SerializationError(serde_json::Error),
    CacheError(rusqlite::Error),
    UnsupportedReferenceFormat(String),
    EmptyReference,
    InvalidBucketCount {
        requested: usize,
        samples: usize,
    },
    RaggedBatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    MissingColumn(String),
    KindMismatch {
        expected: FeatureKind,
        actual: FeatureKind,
    },
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
    Other(String),
}

impl std::fmt::Display for DriftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftError::IoError(e) => write!(f, "IO Error: {}", e),
            DriftError::SerializationError(e) => write!(f, "Serialization Error: {}", e),
            DriftError::CacheError(e) => write!(f, "Cache Error: {}", e),
            DriftError::UnsupportedReferenceFormat(ext) => {
                write!(f, "Reference data file type not recognized: .{}", ext)
            }
            DriftError::EmptyReference => write!(f, "Reference dataset is empty"),
            DriftError::InvalidBucketCount { requested, samples } => {
                write!(
                    f,
                    "Requested {} buckets but reference has only {} samples",
                    requested, samples
                )
            }
            DriftError::RaggedBatch {
                column,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Ragged batch: column '{}' has {} values, expected {}",
                    column, actual, expected
                )
            }
            DriftError::MissingColumn(name) => write!(f, "Missing column '{}'", name),
            DriftError::KindMismatch { expected, actual } => {
                write!(f, "Feature kind mismatch: expected {:?}, got {:?}", expected, actual)
            }
            DriftError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Vector has {} dimensions, scheme expects {}",
                    actual, expected
                )
            }
            DriftError::Other(msg) => write!(f, "Drift Error: {}", msg),
        }
    }
}

impl std::error::Error for DriftError {}

impl From<std::io::Error> for DriftError {
    fn from(err: std::io::Error) -> Self {
        DriftError::IoError(err)
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::SerializationError(err)
    }
}

impl From<rusqlite::Error> for DriftError {
    fn from(err: rusqlite::Error) -> Self {
        DriftError::CacheError(err)
    }
}
