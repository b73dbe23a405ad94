//! Model store and inference components

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod scaler;
pub mod summary;

pub use classifier::{Classifier, LinearClassifier};
pub use inference::InferenceService;
pub use loader::{ModelStore, OnnxClassifier};
pub use scaler::{FeatureScaler, StandardScaler};
