//! Binary stress classifiers

use crate::error::{InferenceError, Result};
use crate::feature_extractor::FEATURE_COUNT;
use crate::types::reading::NormalizedVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A pre-trained classifier over normalized readings.
pub trait Classifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// One raw class per input row
    fn predict(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>>;
}

/// Linear decision function exported from a fitted logistic regression.
///
/// Predicts class 1 when `w·x + b > 0`, i.e. when the probability exceeds 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.len() != FEATURE_COUNT {
            return Err(InferenceError::Shape {
                expected: FEATURE_COUNT,
                actual: coefficients.len(),
            });
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Load coefficients from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| InferenceError::artifact(path, e))?;
        let model: LinearClassifier =
            serde_json::from_str(&contents).map_err(|e| InferenceError::artifact(path, e))?;
        let model = Self::new(model.coefficients, model.intercept)
            .map_err(|e| InferenceError::artifact(path, e))?;

        info!(path = %path.display(), "Linear classifier loaded");
        Ok(model)
    }

    /// Raw decision value for one row
    pub fn decision(&self, row: &NormalizedVector) -> f64 {
        row.values()
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>> {
        Ok(rows
            .iter()
            .map(|row| if self.decision(row) > 0.0 { 1 } else { 0 })
            .collect())
    }
}
