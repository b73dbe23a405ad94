//! Stress labels and the request/reply messages of the prediction service

use crate::error::{InferenceError, Result};
use crate::types::reading::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary stress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressLabel {
    Low,
    High,
}

impl StressLabel {
    /// Map a raw classifier class onto a label: 1 is High, 0 is Low.
    pub fn from_class(class: i64) -> Result<Self> {
        match class {
            0 => Ok(StressLabel::Low),
            1 => Ok(StressLabel::High),
            other => Err(InferenceError::UnexpectedClass(other)),
        }
    }

    /// Numeric level printed alongside the label in the time series
    pub fn as_class(self) -> i64 {
        match self {
            StressLabel::Low => 0,
            StressLabel::High => 1,
        }
    }

    /// Short form used in the result table
    pub fn as_str(self) -> &'static str {
        match self {
            StressLabel::Low => "Low",
            StressLabel::High => "High",
        }
    }

    /// Long form used for a single prediction
    pub fn headline(self) -> &'static str {
        match self {
            StressLabel::Low => "Low Stress",
            StressLabel::High => "High Stress",
        }
    }
}

impl fmt::Display for StressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction request received over NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Readings to classify, one label is returned per entry
    pub readings: Vec<FeatureVector>,
}

/// Reply to a [`PredictionRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique response identifier
    pub response_id: String,

    /// One label per reading, in request order
    pub labels: Vec<StressLabel>,

    pub high_count: usize,
    pub low_count: usize,

    /// Set when the request was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    /// Build a successful response from labels
    pub fn from_labels(labels: Vec<StressLabel>) -> Self {
        let high_count = labels.iter().filter(|&&l| l == StressLabel::High).count();
        let low_count = labels.len() - high_count;

        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            labels,
            high_count,
            low_count,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Build a rejection carrying the error message
    pub fn rejected(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::from_labels(Vec::new())
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.error.is_some()
    }
}
