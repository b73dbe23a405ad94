//! Physiological readings fed to the stress classifier

use crate::error::{InferenceError, Result};
use crate::feature_extractor::{FEATURE_COUNT, FEATURE_SPECS};
use serde::{Deserialize, Serialize};

/// One set of the eight readings, in the order the scaler was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Heart rate (bpm)
    #[serde(alias = "Heart Rate")]
    pub heart_rate: f64,

    /// Breathing rate (breaths/min)
    #[serde(alias = "Breathing Rate")]
    pub breathing_rate: f64,

    /// Body temperature (°C)
    #[serde(alias = "Temperature")]
    pub temperature: f64,

    /// Movement (m/s²)
    #[serde(alias = "Movement")]
    pub movement: f64,

    /// Ambient sound level (dB)
    #[serde(alias = "Sound Level")]
    pub sound_level: f64,

    /// Oxygen saturation (%)
    #[serde(alias = "Oxygen Saturation")]
    pub oxygen_saturation: f64,

    /// Sleep duration (hours)
    #[serde(alias = "Sleep Duration")]
    pub sleep_duration: f64,

    /// Blood pressure (mmHg)
    #[serde(alias = "Blood Pressure")]
    pub blood_pressure: f64,
}

impl FeatureVector {
    /// Build a vector from exactly eight values in feature order.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(InferenceError::Shape {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }

        Ok(Self {
            heart_rate: values[0],
            breathing_rate: values[1],
            temperature: values[2],
            movement: values[3],
            sound_level: values[4],
            oxygen_saturation: values[5],
            sleep_duration: values[6],
            blood_pressure: values[7],
        })
    }

    /// Values in the fixed feature order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.heart_rate,
            self.breathing_rate,
            self.temperature,
            self.movement,
            self.sound_level,
            self.oxygen_saturation,
            self.sleep_duration,
            self.blood_pressure,
        ]
    }

    /// Check the readings against the form input ranges.
    ///
    /// Only the interactive path enforces these; uploaded rows are taken as-is.
    pub fn validate_ranges(&self) -> Result<()> {
        for (spec, value) in FEATURE_SPECS.iter().zip(self.to_array()) {
            if !value.is_finite() || value < spec.min || value > spec.max {
                return Err(InferenceError::OutOfRange {
                    feature: spec.name,
                    value,
                    min: spec.min,
                    max: spec.max,
                });
            }
            if spec.integer && value.fract() != 0.0 {
                return Err(InferenceError::InvalidValue {
                    row: 0,
                    column: spec.name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// All readings at the lower end of the form ranges
    pub fn minimums() -> Self {
        let mins: Vec<f64> = FEATURE_SPECS.iter().map(|s| s.min).collect();
        Self::from_slice(&mins).unwrap_or_default()
    }

    /// All readings at the upper end of the form ranges
    pub fn maximums() -> Self {
        let maxs: Vec<f64> = FEATURE_SPECS.iter().map(|s| s.max).collect();
        Self::from_slice(&maxs).unwrap_or_default()
    }
}

impl Default for FeatureVector {
    /// The form's initial state: every input at its minimum.
    fn default() -> Self {
        Self {
            heart_rate: 40.0,
            breathing_rate: 10.0,
            temperature: 30.0,
            movement: 0.0,
            sound_level: 20.0,
            oxygen_saturation: 50.0,
            sleep_duration: 0.0,
            blood_pressure: 80.0,
        }
    }
}

/// A scaled feature vector, unit-less, same arity as [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVector(pub [f64; FEATURE_COUNT]);

impl NormalizedVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}
