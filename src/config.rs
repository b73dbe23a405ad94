//! Configuration management for the stress inference service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Which classifier artifact format to load
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// ONNX graph run through ONNX Runtime
    #[default]
    Onnx,
    /// JSON coefficients of a linear model
    Linear,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub nats: NatsConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model store artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Fitted scaler parameters (JSON)
    pub scaler_path: String,
    /// Classifier artifact
    pub classifier_path: String,
    #[serde(default)]
    pub classifier: ClassifierKind,
    /// Threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject prediction requests arrive on
    pub request_subject: String,
}

/// Serve mode settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Seconds between metrics summaries, 0 disables them
    pub report_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path; the file must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig {
                scaler_path: "artifacts/scaler.json".to_string(),
                classifier_path: "artifacts/linear_model.json".to_string(),
                classifier: ClassifierKind::Linear,
                onnx_threads: 1,
            },
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "stress.predict".to_string(),
            },
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
