//! Stress Inference Library
//!
//! Classifies eight physiological readings into a Low/High stress label using
//! a pre-fitted scaler and classifier, one reading at a time or in bulk from
//! CSV uploads, with the aggregates needed to chart a batch.

pub mod batch;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod server;
pub mod types;

pub use batch::{process_batch, BatchInput, BatchReport, BatchResult};
pub use config::AppConfig;
pub use error::{InferenceError, Result};
pub use feature_extractor::FeatureExtractor;
pub use models::{InferenceService, ModelStore};
pub use types::{BatchSummary, FeatureVector, NormalizedVector, StressLabel};
