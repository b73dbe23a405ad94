//! Stress inference service: normalize, classify, label and summarize readings

use crate::error::{InferenceError, Result};
use crate::models::loader::ModelStore;
use crate::models::summary;
use crate::types::prediction::StressLabel;
use crate::types::reading::{FeatureVector, NormalizedVector};
use crate::types::summary::BatchSummary;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info};

/// Stateless inference over an immutable [`ModelStore`].
///
/// Cheap to clone; clones share the same artifacts.
#[derive(Clone)]
pub struct InferenceService {
    store: Arc<ModelStore>,
}

impl InferenceService {
    /// Create a service over a loaded model store
    pub fn new(store: ModelStore) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Create a service over a store shared with other components
    pub fn from_shared(store: Arc<ModelStore>) -> Self {
        info!(
            classifier = store.classifier().name(),
            "Inference service initialized"
        );
        Self { store }
    }

    /// Apply the fitted scaler to each row, preserving row order
    pub fn normalize(&self, rows: &[FeatureVector]) -> Result<Vec<NormalizedVector>> {
        let normalized = self.store.scaler().transform(rows)?;
        if normalized.len() != rows.len() {
            return Err(InferenceError::Shape {
                expected: rows.len(),
                actual: normalized.len(),
            });
        }
        Ok(normalized)
    }

    /// Run the classifier; one raw class per row
    pub fn classify(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>> {
        let classes = self.store.classifier().predict(rows)?;
        if classes.len() != rows.len() {
            return Err(InferenceError::Shape {
                expected: rows.len(),
                actual: classes.len(),
            });
        }
        Ok(classes)
    }

    /// Map raw classes onto labels: 1 is High, 0 is Low, anything else is rejected.
    pub fn label(&self, raw: &[i64]) -> Result<Vec<StressLabel>> {
        raw.iter().map(|&class| StressLabel::from_class(class)).collect()
    }

    /// Aggregate a labelled batch: label counts, feature correlations and,
    /// when timestamps are given, the label series in time order. Rows with
    /// a missing timestamp are left out of the series.
    pub fn summarize(
        &self,
        rows: &[FeatureVector],
        labels: &[StressLabel],
        timestamps: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<BatchSummary> {
        summary::summarize(rows, labels, timestamps)
    }

    /// Classify a single reading
    pub fn predict(&self, reading: &FeatureVector) -> Result<StressLabel> {
        let normalized = self.normalize(std::slice::from_ref(reading))?;
        let classes = self.classify(&normalized)?;
        let label = self
            .label(&classes)?
            .into_iter()
            .next()
            .ok_or(InferenceError::Shape {
                expected: 1,
                actual: 0,
            })?;

        debug!(label = %label, "Single prediction complete");
        Ok(label)
    }

    /// Classify many readings; labels come back in input order.
    pub fn predict_batch(&self, readings: &[FeatureVector]) -> Result<Vec<StressLabel>> {
        if readings.is_empty() {
            return Err(InferenceError::EmptyBatch);
        }

        let normalized = self.normalize(readings)?;
        let classes = self.classify(&normalized)?;
        let labels = self.label(&classes)?;

        debug!(rows = labels.len(), "Batch prediction complete");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::{Classifier, LinearClassifier};
    use crate::models::scaler::StandardScaler;

    fn service() -> InferenceService {
        let scaler = StandardScaler::new(
            vec![80.0, 20.0, 37.0, 1.0, 60.0, 95.0, 7.0, 125.0],
            vec![20.0, 5.0, 1.0, 1.0, 20.0, 5.0, 2.0, 20.0],
        )
        .unwrap();
        let classifier =
            LinearClassifier::new(vec![1.5, 0.5, 0.2, 0.1, 0.3, -0.4, -1.0, 1.0], -0.5).unwrap();
        InferenceService::new(ModelStore::new(Box::new(scaler), Box::new(classifier)))
    }

    fn resting() -> FeatureVector {
        FeatureVector {
            heart_rate: 72.0,
            breathing_rate: 16.0,
            temperature: 36.6,
            movement: 0.1,
            sound_level: 40.0,
            oxygen_saturation: 98.0,
            sleep_duration: 7.0,
            blood_pressure: 120.0,
        }
    }

    /// Always answers with a fixed class, regardless of input.
    struct ConstantClassifier(i64);

    impl Classifier for ConstantClassifier {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>> {
            Ok(vec![self.0; rows.len()])
        }
    }

    /// Drops the last row, violating the arity contract.
    struct TruncatingClassifier;

    impl Classifier for TruncatingClassifier {
        fn name(&self) -> &str {
            "truncating"
        }

        fn predict(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>> {
            Ok(vec![0; rows.len().saturating_sub(1)])
        }
    }

    fn service_with(classifier: Box<dyn Classifier>) -> InferenceService {
        let scaler = StandardScaler::new(vec![0.0; 8], vec![1.0; 8]).unwrap();
        InferenceService::new(ModelStore::new(Box::new(scaler), classifier))
    }

    #[test]
    fn test_resting_reading_yields_a_label() {
        let label = service().predict(&resting()).unwrap();
        assert!(matches!(label, StressLabel::Low | StressLabel::High));
        assert_eq!(label, StressLabel::Low);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let svc = service();
        let reading = resting();
        let first = svc.predict(&reading).unwrap();
        for _ in 0..10 {
            assert_eq!(svc.predict(&reading).unwrap(), first);
        }
    }

    #[test]
    fn test_boundary_readings_classify() {
        let svc = service();
        assert!(svc.predict(&FeatureVector::minimums()).is_ok());
        assert!(svc.predict(&FeatureVector::maximums()).is_ok());
    }

    #[test]
    fn test_single_and_batch_paths_agree() {
        let svc = service();
        let readings = vec![resting(), FeatureVector::maximums(), FeatureVector::minimums()];
        let batch = svc.predict_batch(&readings).unwrap();
        let single: Vec<StressLabel> = readings.iter().map(|r| svc.predict(r).unwrap()).collect();
        assert_eq!(batch, single);
        assert_eq!(batch[1], StressLabel::High);
    }

    #[test]
    fn test_relabeling_reproduces_labels() {
        let svc = service();
        let readings = vec![resting(), FeatureVector::maximums(), resting()];
        let normalized = svc.normalize(&readings).unwrap();
        let first = svc.label(&svc.classify(&normalized).unwrap()).unwrap();
        let second = svc.label(&svc.classify(&normalized).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_arity_is_preserved() {
        let svc = service();
        for n in [1usize, 2, 7, 64] {
            let readings = vec![resting(); n];
            let normalized = svc.normalize(&readings).unwrap();
            assert_eq!(normalized.len(), n);
            assert_eq!(svc.classify(&normalized).unwrap().len(), n);
        }
    }

    #[test]
    fn test_empty_batch() {
        let err = service().predict_batch(&[]).unwrap_err();
        assert!(err.is_empty_batch());
    }

    #[test]
    fn test_label_mapping() {
        let svc = service();
        assert_eq!(
            svc.label(&[1, 0, 1]).unwrap(),
            vec![StressLabel::High, StressLabel::Low, StressLabel::High]
        );
        assert!(matches!(
            svc.label(&[0, 3]),
            Err(InferenceError::UnexpectedClass(3))
        ));
    }

    #[test]
    fn test_unexpected_class_rejected_on_both_paths() {
        let svc = service_with(Box::new(ConstantClassifier(2)));
        assert!(matches!(
            svc.predict(&resting()),
            Err(InferenceError::UnexpectedClass(2))
        ));
        assert!(matches!(
            svc.predict_batch(&[resting()]),
            Err(InferenceError::UnexpectedClass(2))
        ));
    }

    #[test]
    fn test_classifier_arity_violation_is_shape_error() {
        let svc = service_with(Box::new(TruncatingClassifier));
        let err = svc.predict_batch(&[resting(), resting()]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Shape {
                expected: 2,
                actual: 1
            }
        ));
    }
}
