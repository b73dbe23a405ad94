//! Feature layout for stress model inference.
//!
//! The scaler and classifier were fitted on eight readings in a fixed order.
//! This module owns that order, the form input ranges, and the mapping from
//! uploaded table headers onto it.

use crate::error::{InferenceError, Result};
use crate::types::reading::FeatureVector;

/// Number of features the artifacts were fitted on
pub const FEATURE_COUNT: usize = 8;

/// Optional column enabling the label-over-time series
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Feature names in fitted order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "heart_rate",
    "breathing_rate",
    "temperature",
    "movement",
    "sound_level",
    "oxygen_saturation",
    "sleep_duration",
    "blood_pressure",
];

/// Input description for one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    /// Whole numbers only
    pub integer: bool,
}

impl FeatureSpec {
    /// Display name with unit, e.g. `Heart Rate (bpm)`
    pub fn caption(&self) -> String {
        format!("{} ({})", self.label, self.unit)
    }
}

/// Form input ranges, same order as [`FEATURE_NAMES`]
pub const FEATURE_SPECS: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        name: "heart_rate",
        label: "Heart Rate",
        unit: "bpm",
        min: 40.0,
        max: 200.0,
        integer: true,
    },
    FeatureSpec {
        name: "breathing_rate",
        label: "Breathing Rate",
        unit: "breaths/min",
        min: 10.0,
        max: 50.0,
        integer: true,
    },
    FeatureSpec {
        name: "temperature",
        label: "Body Temperature",
        unit: "°C",
        min: 30.0,
        max: 45.0,
        integer: false,
    },
    FeatureSpec {
        name: "movement",
        label: "Movement",
        unit: "m/s²",
        min: 0.0,
        max: 5.0,
        integer: false,
    },
    FeatureSpec {
        name: "sound_level",
        label: "Sound Level",
        unit: "dB",
        min: 20.0,
        max: 120.0,
        integer: false,
    },
    FeatureSpec {
        name: "oxygen_saturation",
        label: "Oxygen Saturation",
        unit: "%",
        min: 50.0,
        max: 100.0,
        integer: false,
    },
    FeatureSpec {
        name: "sleep_duration",
        label: "Sleep Duration",
        unit: "hours",
        min: 0.0,
        max: 12.0,
        integer: false,
    },
    FeatureSpec {
        name: "blood_pressure",
        label: "Blood Pressure",
        unit: "mmHg",
        min: 80.0,
        max: 200.0,
        integer: true,
    },
];

/// Canonical header form: trimmed, lowercase, spaces and dashes as underscores.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Position of each feature, and of the timestamp, within an uploaded table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column index of each feature, in fitted order
    pub feature_columns: [usize; FEATURE_COUNT],
    /// Column index of the timestamp, if present
    pub timestamp_column: Option<usize>,
}

impl ColumnMapping {
    /// Match headers onto the fitted feature order by name.
    ///
    /// Columns may appear in any order; extra columns are ignored.
    pub fn from_headers<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();
        let timestamp_key = normalize_header(TIMESTAMP_COLUMN);

        let mut feature_columns = [0usize; FEATURE_COUNT];
        for (slot, name) in feature_columns.iter_mut().zip(FEATURE_NAMES) {
            *slot = normalized
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| InferenceError::MissingColumn(name.to_string()))?;
        }

        let timestamp_column = normalized.iter().position(|h| *h == timestamp_key);

        Ok(Self {
            feature_columns,
            timestamp_column,
        })
    }
}

/// Turns readings into model input rows.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parse one table record through a column mapping.
    ///
    /// `row` is the 1-based data row number used in error messages. Empty,
    /// non-numeric and non-finite (`NaN`, `inf`) cells are rejected.
    pub fn extract_record(
        &self,
        record: &csv::StringRecord,
        mapping: &ColumnMapping,
        row: usize,
    ) -> Result<FeatureVector> {
        let mut values = [0.0f64; FEATURE_COUNT];

        for ((value, &column), name) in values
            .iter_mut()
            .zip(mapping.feature_columns.iter())
            .zip(FEATURE_NAMES)
        {
            let raw = record.get(column).unwrap_or("").trim();
            *value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| InferenceError::InvalidValue {
                    row,
                    column: name.to_string(),
                    value: raw.to_string(),
                })?;
        }

        FeatureVector::from_slice(&values)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_match_names() {
        for (spec, name) in FEATURE_SPECS.iter().zip(FEATURE_NAMES) {
            assert_eq!(spec.name, name);
            assert!(spec.min < spec.max);
        }
        assert_eq!(FEATURE_SPECS[0].caption(), "Heart Rate (bpm)");
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Heart Rate "), "heart_rate");
        assert_eq!(normalize_header("Oxygen-Saturation"), "oxygen_saturation");
        assert_eq!(normalize_header("TIMESTAMP"), "timestamp");
    }

    #[test]
    fn test_mapping_any_order() {
        let headers = [
            "blood_pressure",
            "Timestamp",
            "sleep_duration",
            "oxygen_saturation",
            "sound_level",
            "note",
            "movement",
            "temperature",
            "breathing_rate",
            "heart_rate",
        ];
        let mapping = ColumnMapping::from_headers(headers).unwrap();
        assert_eq!(mapping.feature_columns, [9, 8, 7, 6, 4, 3, 2, 0]);
        assert_eq!(mapping.timestamp_column, Some(1));
    }

    #[test]
    fn test_mapping_missing_column() {
        let headers = ["heart_rate", "breathing_rate", "temperature"];
        let err = ColumnMapping::from_headers(headers).unwrap_err();
        assert!(matches!(err, InferenceError::MissingColumn(ref c) if c == "movement"));
    }

    #[test]
    fn test_extract_record() {
        let extractor = FeatureExtractor::new();
        let mapping = ColumnMapping::from_headers(FEATURE_NAMES).unwrap();
        assert_eq!(mapping.timestamp_column, None);

        let record = csv::StringRecord::from(vec![
            "72", "16", "36.6", "0.1", "40", "98", "7", "120",
        ]);
        let reading = extractor.extract_record(&record, &mapping, 1).unwrap();
        assert_eq!(reading.heart_rate, 72.0);
        assert_eq!(reading.temperature, 36.6);

        let bad = csv::StringRecord::from(vec![
            "72", "fast", "36.6", "0.1", "40", "98", "7", "120",
        ]);
        let err = extractor.extract_record(&bad, &mapping, 3).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidValue { row: 3, ref column, .. } if column == "breathing_rate"
        ));
    }

    #[test]
    fn test_non_finite_cells_rejected() {
        let extractor = FeatureExtractor::new();
        let mapping = ColumnMapping::from_headers(FEATURE_NAMES).unwrap();

        for (i, cell) in ["NaN", "nan", "inf", "-infinity"].into_iter().enumerate() {
            let record = csv::StringRecord::from(vec![
                "72", "16", "36.6", "0.1", "40", cell, "7", "120",
            ]);
            let err = extractor.extract_record(&record, &mapping, i + 1).unwrap_err();
            assert!(matches!(
                err,
                InferenceError::InvalidValue { ref column, ref value, .. }
                    if column == "oxygen_saturation" && value == cell
            ));
        }
    }
}
