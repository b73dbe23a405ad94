//! Type definitions for the stress inference service

pub mod prediction;
pub mod reading;
pub mod summary;

pub use prediction::{PredictionRequest, PredictionResponse, StressLabel};
pub use reading::{FeatureVector, NormalizedVector};
pub use summary::{BatchSummary, CorrelationMatrix, LabelCounts, TimelinePoint};
