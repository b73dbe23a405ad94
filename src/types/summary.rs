//! Aggregates computed over a labelled batch

use crate::types::prediction::StressLabel;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Shown instead of the time series when the upload has no timestamps
pub const MISSING_TIMESTAMP_NOTICE: &str =
    "No timestamp column found. Upload data with timestamps for time-series analysis.";

/// Count of each label in a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub high: usize,
    pub low: usize,
}

impl LabelCounts {
    pub fn record(&mut self, label: StressLabel) {
        match label {
            StressLabel::High => self.high += 1,
            StressLabel::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.low
    }

    /// Share of High labels, 0.0 for an empty batch
    pub fn high_fraction(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.high as f64 / self.total() as f64
        }
    }
}

/// Pairwise Pearson correlation between feature columns.
///
/// A cell is `None` when either column has zero variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub features: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Look up the coefficient between two named features
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.features.iter().position(|f| f == a)?;
        let j = self.features.iter().position(|f| f == b)?;
        self.values[i][j]
    }

    pub fn size(&self) -> usize {
        self.features.len()
    }
}

/// One point of the label-over-time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: NaiveDateTime,
    pub label: StressLabel,
}

/// Everything the three batch charts are drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub counts: LabelCounts,
    pub correlation: CorrelationMatrix,
    /// Ascending by timestamp; `None` when the upload had no timestamp column
    pub timeline: Option<Vec<TimelinePoint>>,
}

impl BatchSummary {
    /// Informational notice to show in place of a missing time series
    pub fn timeline_notice(&self) -> Option<&'static str> {
        match self.timeline {
            Some(_) => None,
            None => Some(MISSING_TIMESTAMP_NOTICE),
        }
    }
}
