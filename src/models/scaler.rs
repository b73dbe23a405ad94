//! Feature scaling with fitted standardization parameters

use crate::error::{InferenceError, Result};
use crate::feature_extractor::{FEATURE_COUNT, FEATURE_NAMES};
use crate::types::reading::{FeatureVector, NormalizedVector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A fitted feature transform.
pub trait FeatureScaler: Send + Sync {
    /// Scale each row, preserving row and feature order
    fn transform(&self, rows: &[FeatureVector]) -> Result<Vec<NormalizedVector>>;
}

/// Standardization scaler: `(x - mean) / scale` per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Names the scaler was fitted on, checked against the fixed order when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters, validating their shape.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            feature_names: None,
            mean,
            scale,
        };
        scaler.check()?;
        Ok(scaler)
    }

    /// Load fitted parameters from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| InferenceError::artifact(path, e))?;
        let scaler: StandardScaler =
            serde_json::from_str(&contents).map_err(|e| InferenceError::artifact(path, e))?;
        scaler
            .check()
            .map_err(|e| InferenceError::artifact(path, e))?;

        info!(path = %path.display(), features = scaler.mean.len(), "Scaler loaded");
        Ok(scaler)
    }

    fn check(&self) -> Result<()> {
        for params in [&self.mean, &self.scale] {
            if params.len() != FEATURE_COUNT {
                return Err(InferenceError::Shape {
                    expected: FEATURE_COUNT,
                    actual: params.len(),
                });
            }
        }

        if let Some(names) = &self.feature_names {
            if names.len() != FEATURE_COUNT {
                return Err(InferenceError::Shape {
                    expected: FEATURE_COUNT,
                    actual: names.len(),
                });
            }
            if let Some((found, expected)) = names
                .iter()
                .zip(FEATURE_NAMES)
                .find(|(found, expected)| found.as_str() != *expected)
            {
                return Err(InferenceError::Runtime(format!(
                    "scaler fitted on '{}' where '{}' was expected",
                    found, expected
                )));
            }
        }

        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(InferenceError::Runtime(
                "scale must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }

    fn transform_row(&self, row: &FeatureVector) -> NormalizedVector {
        let mut out = row.to_array();
        for ((x, mean), scale) in out.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - mean) / scale;
        }
        NormalizedVector(out)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, rows: &[FeatureVector]) -> Result<Vec<NormalizedVector>> {
        // Parameters can be built by hand, so re-check arity per call.
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(InferenceError::Shape {
                expected: FEATURE_COUNT,
                actual: self.mean.len().min(self.scale.len()),
            });
        }
        Ok(rows.iter().map(|row| self.transform_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler::new(
            vec![80.0, 20.0, 37.0, 1.0, 60.0, 95.0, 7.0, 125.0],
            vec![20.0, 5.0, 1.0, 1.0, 20.0, 5.0, 2.0, 20.0],
        )
        .unwrap()
    }

    #[test]
    fn test_standardization() {
        let row = FeatureVector::from_slice(&[100.0, 25.0, 38.0, 2.0, 80.0, 90.0, 5.0, 145.0])
            .unwrap();
        let out = scaler().transform(&[row]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &[1.0, 1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_preserves_row_order() {
        let rows: Vec<FeatureVector> = (0..5)
            .map(|i| {
                let mut v = FeatureVector::default();
                v.heart_rate = 60.0 + i as f64 * 20.0;
                v
            })
            .collect();
        let out = scaler().transform(&rows).unwrap();
        assert_eq!(out.len(), rows.len());
        let scaled: Vec<f64> = out.iter().map(|v| v.values()[0]).collect();
        assert_eq!(scaled, vec![-1.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let err = StandardScaler::new(vec![0.0; 7], vec![1.0; 7]).unwrap_err();
        assert!(matches!(err, InferenceError::Shape { expected: 8, actual: 7 }));

        let hand_built = StandardScaler {
            feature_names: None,
            mean: vec![0.0; 9],
            scale: vec![1.0; 9],
        };
        assert!(matches!(
            hand_built.transform(&[FeatureVector::default()]),
            Err(InferenceError::Shape { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let mut scale = vec![1.0; 8];
        scale[3] = 0.0;
        assert!(StandardScaler::new(vec![0.0; 8], scale).is_err());
    }

    #[test]
    fn test_feature_name_check() {
        let mut s = scaler();
        s.feature_names = Some(FEATURE_NAMES.iter().map(|n| n.to_string()).collect());
        assert!(s.check().is_ok());

        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|n| n.to_string()).collect();
        names.swap(0, 1);
        s.feature_names = Some(names);
        assert!(s.check().is_err());
    }
}
