//! Model store loading: the fitted scaler and the ONNX or linear classifier

use crate::config::{ClassifierKind, ModelsConfig};
use crate::error::{InferenceError, Result};
use crate::models::classifier::{Classifier, LinearClassifier};
use crate::models::scaler::{FeatureScaler, StandardScaler};
use crate::types::reading::NormalizedVector;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// The two pre-trained artifacts, loaded once and read-only afterwards.
pub struct ModelStore {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn Classifier>,
}

impl ModelStore {
    /// Assemble a store from already-built artifacts
    pub fn new(scaler: Box<dyn FeatureScaler>, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Load both artifacts from the configured paths.
    ///
    /// Any failure is an `ArtifactLoad` error and should abort startup.
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        let scaler = StandardScaler::from_file(&config.scaler_path)?;

        let classifier: Box<dyn Classifier> = match config.classifier {
            ClassifierKind::Onnx => Box::new(OnnxClassifier::from_file(
                &config.classifier_path,
                config.onnx_threads,
            )?),
            ClassifierKind::Linear => {
                Box::new(LinearClassifier::from_file(&config.classifier_path)?)
            }
        };

        info!(
            scaler = %config.scaler_path,
            classifier = classifier.name(),
            "Model store loaded"
        );

        Ok(Self::new(Box::new(scaler), classifier))
    }

    pub fn scaler(&self) -> &dyn FeatureScaler {
        self.scaler.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// Classifier graph run through ONNX Runtime
pub struct OnnxClassifier {
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    /// Integer class output
    label_name: String,
}

impl OnnxClassifier {
    /// Load an ONNX classifier from file
    pub fn from_file<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InferenceError::artifact(path, "file not found"));
        }

        let session = build_session(path, onnx_threads)
            .map_err(|e| InferenceError::artifact(path, format!("{e:#}")))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::artifact(path, "model has no outputs"))?;

        info!(
            input = %input_name,
            output = %label_name,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_name,
        })
    }
}

fn build_session(path: &Path, onnx_threads: usize) -> anyhow::Result<Session> {
    ort::init().commit()?;
    info!(path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn predict(&self, rows: &[NormalizedVector]) -> Result<Vec<i64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let width = rows[0].values().len();
        let data: Vec<f32> = rows
            .iter()
            .flat_map(|r| r.values().iter().map(|&v| v as f32))
            .collect();
        let shape = vec![rows.len() as i64, width as i64];

        let input = Tensor::from_array((shape, data))
            .map_err(|e| InferenceError::Runtime(format!("failed to build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Runtime(format!("lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let output = outputs.get(self.label_name.as_str()).ok_or_else(|| {
            InferenceError::Runtime(format!("missing output '{}'", self.label_name))
        })?;

        // skl2onnx exports int64 labels; some converters emit float scores instead.
        let classes: Vec<i64> = if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            data.to_vec()
        } else {
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Runtime(e.to_string()))?;
            data.iter().map(|&v| v.round() as i64).collect()
        };

        debug!(rows = rows.len(), "ONNX inference complete");
        Ok(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts").join(name)
    }

    #[test]
    fn test_onnx_agrees_with_linear_export() {
        // Both artifacts encode the same coefficients
        let onnx = OnnxClassifier::from_file(artifact("linear_model.onnx"), 1).unwrap();
        let linear = LinearClassifier::from_file(artifact("linear_model.json")).unwrap();

        let rows = vec![
            NormalizedVector([-1.0; 8]),
            NormalizedVector([1.0; 8]),
            NormalizedVector([-1.0, -1.0, 0.0, 0.0, -1.0, 1.0, 1.0, -1.0]),
            NormalizedVector([2.0, 1.5, 0.5, 0.5, 1.0, -1.0, -1.5, 1.5]),
        ];
        let classes = onnx.predict(&rows).unwrap();
        assert_eq!(classes, vec![0, 1, 0, 1]);
        assert_eq!(classes, linear.predict(&rows).unwrap());
        assert!(onnx.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_store_loads_onnx_classifier() {
        let config = ModelsConfig {
            scaler_path: artifact("scaler.json").to_string_lossy().into_owned(),
            classifier_path: artifact("linear_model.onnx").to_string_lossy().into_owned(),
            classifier: ClassifierKind::Onnx,
            onnx_threads: 1,
        };
        let store = ModelStore::load(&config).unwrap();
        assert_eq!(store.classifier().name(), "onnx");

        let row = NormalizedVector([1.0; 8]);
        assert_eq!(store.classifier().predict(&[row]).unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_onnx_file() {
        let result = OnnxClassifier::from_file("does/not/exist.onnx", 1);
        assert!(matches!(result, Err(InferenceError::ArtifactLoad { .. })));
    }

    #[test]
    fn test_missing_scaler_aborts_load() {
        let config = ModelsConfig {
            scaler_path: "does/not/exist.json".to_string(),
            classifier_path: "does/not/exist.json".to_string(),
            classifier: ClassifierKind::Linear,
            onnx_threads: 1,
        };
        assert!(matches!(
            ModelStore::load(&config),
            Err(InferenceError::ArtifactLoad { .. })
        ));
    }
}
