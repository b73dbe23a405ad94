//! Stress Inference - Main Entry Point
//!
//! Predicts stress levels from a single set of readings, from a CSV upload,
//! or for prediction requests arriving over NATS.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stress_inference::{
    batch::{process_batch, BatchInput, BatchReport},
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    feature_extractor::FEATURE_SPECS,
    models::{InferenceService, ModelStore},
    server, FeatureVector,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stress-inference",
    version,
    about = "Stress level prediction from health parameters"
)]
struct Cli {
    /// Configuration file [default: config/config.toml, built-in defaults if absent]
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the stress level for one set of readings
    Predict {
        /// Heart rate (bpm, 40-200)
        #[arg(long)]
        heart_rate: f64,
        /// Breathing rate (breaths/min, 10-50)
        #[arg(long)]
        breathing_rate: f64,
        /// Body temperature (°C, 30-45)
        #[arg(long)]
        temperature: f64,
        /// Movement (m/s², 0-5)
        #[arg(long)]
        movement: f64,
        /// Sound level (dB, 20-120)
        #[arg(long)]
        sound_level: f64,
        /// Oxygen saturation (%, 50-100)
        #[arg(long)]
        oxygen_saturation: f64,
        /// Sleep duration (hours, 0-12)
        #[arg(long)]
        sleep_duration: f64,
        /// Blood pressure (mmHg, 80-200)
        #[arg(long)]
        blood_pressure: f64,
    },
    /// Predict stress levels for every row of a CSV file
    Batch {
        /// CSV file with the eight feature columns and an optional Timestamp
        file: PathBuf,
        /// Write the labelled table here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer prediction requests over NATS
    Serve,
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("stress_inference={}", logging.level)))
        .context("Invalid log level")?;

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit path must exist; the default one may be absent.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load_or_default(&config_path)?,
    };
    init_logging(&config.logging)?;
    info!(config = %config_path.display(), "Configuration loaded");

    // Artifacts are loaded once; failure here aborts startup.
    let store = ModelStore::load(&config.models).context("Failed to load model store")?;
    let service = InferenceService::new(store);

    match cli.command {
        Commands::Predict {
            heart_rate,
            breathing_rate,
            temperature,
            movement,
            sound_level,
            oxygen_saturation,
            sleep_duration,
            blood_pressure,
        } => {
            let reading = FeatureVector {
                heart_rate,
                breathing_rate,
                temperature,
                movement,
                sound_level,
                oxygen_saturation,
                sleep_duration,
                blood_pressure,
            };
            reading.validate_ranges()?;

            for (spec, value) in FEATURE_SPECS.iter().zip(reading.to_array()) {
                println!("{:>30}: {}", spec.caption(), value);
            }

            let label = service.predict(&reading)?;
            println!("Predicted Stress Level: {}", label.headline());
        }
        Commands::Batch { file, output, json } => {
            let outcome =
                BatchInput::from_path(&file).and_then(|input| process_batch(&service, input));
            let report = match outcome {
                Ok(report) => report,
                Err(e) if e.is_empty_batch() => {
                    info!(
                        file = %file.display(),
                        "Uploaded file contains no rows, nothing to predict"
                    );
                    return Ok(());
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Batch prediction failed for {}", file.display())));
                }
            };

            match output {
                Some(path) => report.result.write_to_path(&path)?,
                None => report.result.write_csv(std::io::stdout().lock())?,
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            } else {
                print_summary(&report);
            }
        }
        Commands::Serve => {
            server::serve(&config, service).await?;
        }
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    let summary = &report.summary;

    println!();
    println!("Stress Level Distribution");
    let high_pct = summary.counts.high_fraction() * 100.0;
    println!("  High: {:>6} ({:>5.1}%)", summary.counts.high, high_pct);
    println!("  Low:  {:>6} ({:>5.1}%)", summary.counts.low, 100.0 - high_pct);

    println!();
    println!("Feature Correlation");
    let short: Vec<String> = FEATURE_SPECS
        .iter()
        .map(|s| s.label.chars().take(8).collect())
        .collect();
    print!("{:>18}", "");
    for name in &short {
        print!("{:>9}", name);
    }
    println!();
    for (spec, row) in FEATURE_SPECS.iter().zip(&summary.correlation.values) {
        print!("{:>18}", spec.label);
        for cell in row {
            match cell {
                Some(r) => print!("{:>9.2}", r),
                None => print!("{:>9}", "-"),
            }
        }
        println!();
    }

    println!();
    match &summary.timeline {
        Some(points) => {
            println!("Stress Level Over Time");
            for point in points {
                println!(
                    "  {}  {} {}",
                    point.timestamp,
                    point.label.as_class(),
                    point.label
                );
            }
        }
        None => {
            if let Some(notice) = summary.timeline_notice() {
                println!("{}", notice);
            }
        }
    }
}
