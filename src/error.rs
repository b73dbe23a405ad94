//! Error types for the stress inference service

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading artifacts, validating readings or classifying them.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Model store artifact missing or corrupt. Fatal at startup.
    #[error("failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Feature count does not match the fitted feature order
    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// Uploaded table lacks one of the feature columns
    #[error("missing feature column '{0}'")]
    MissingColumn(String),

    /// Empty or non-numeric cell
    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// Form input outside the accepted range
    #[error("{feature} = {value} is outside the accepted range [{min}, {max}]")]
    OutOfRange {
        feature: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("row {row}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    /// Classifier produced a class other than 0 or 1
    #[error("classifier returned unexpected class {0}")]
    UnexpectedClass(i64),

    /// Zero rows were supplied. Informational, not a failure of the service.
    #[error("batch contains no rows")]
    EmptyBatch,

    #[error("inference runtime error: {0}")]
    Runtime(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InferenceError {
    /// Shorthand for artifact load failures
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        InferenceError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only means "nothing to do"
    pub fn is_empty_batch(&self) -> bool {
        matches!(self, InferenceError::EmptyBatch)
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;
