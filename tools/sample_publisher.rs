//! Sample Reading Publisher
//!
//! Sends randomly generated readings to the stress inference service over NATS,
//! or writes them as a CSV upload when no server is reachable.

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;
use stress_inference::types::{FeatureVector, PredictionRequest, PredictionResponse};
use tracing::{info, warn};

/// Reading generator for testing
struct ReadingGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ReadingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Readings typical of a relaxed subject
    fn generate_relaxed(&mut self) -> FeatureVector {
        FeatureVector {
            heart_rate: self.rng.gen_range(55..85) as f64,
            breathing_rate: self.rng.gen_range(12..20) as f64,
            temperature: round1(self.rng.gen_range(36.1..37.2)),
            movement: round1(self.rng.gen_range(0.0..1.0)),
            sound_level: round1(self.rng.gen_range(25.0..55.0)),
            oxygen_saturation: round1(self.rng.gen_range(96.0..100.0)),
            sleep_duration: round1(self.rng.gen_range(6.5..9.0)),
            blood_pressure: self.rng.gen_range(100..130) as f64,
        }
    }

    /// Readings typical of a stressed subject
    fn generate_stressed(&mut self) -> FeatureVector {
        FeatureVector {
            heart_rate: self.rng.gen_range(100..170) as f64,
            breathing_rate: self.rng.gen_range(24..40) as f64,
            temperature: round1(self.rng.gen_range(37.2..38.8)),
            movement: round1(self.rng.gen_range(1.5..4.5)),
            sound_level: round1(self.rng.gen_range(70.0..110.0)),
            oxygen_saturation: round1(self.rng.gen_range(88.0..95.0)),
            sleep_duration: round1(self.rng.gen_range(2.0..5.5)),
            blood_pressure: self.rng.gen_range(140..185) as f64,
        }
    }

    fn generate(&mut self, stress_rate: f64) -> FeatureVector {
        if self.rng.gen_bool(stress_rate) {
            self.generate_stressed()
        } else {
            self.generate_relaxed()
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_publisher=info".parse()?),
        )
        .init();

    info!("Starting Sample Reading Publisher");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("stress.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let stress_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        stress_rate = stress_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Writing a sample CSV instead.");
            return write_sample_csv(count, stress_rate);
        }
    };

    let mut generator = ReadingGenerator::new();
    let mut high_count = 0;
    let mut rejected = 0;

    for i in 0..count {
        let request = PredictionRequest {
            readings: vec![generator.generate(stress_rate)],
        };
        let payload = serde_json::to_vec(&request)?;

        let message = client.request(subject.to_string(), payload.into()).await?;
        let response: PredictionResponse = serde_json::from_slice(&message.payload)?;

        if response.is_rejected() {
            rejected += 1;
            warn!(error = ?response.error, "Request rejected");
        } else {
            high_count += response.high_count;
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} requests ({} high stress, {} rejected)",
                i + 1,
                count,
                high_count,
                rejected
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} high stress, {} rejected)",
        count, high_count, rejected
    );

    Ok(())
}

/// Dry-run mode: print a CSV upload with one reading per minute
fn write_sample_csv(count: u64, stress_rate: f64) -> anyhow::Result<()> {
    let mut generator = ReadingGenerator::new();
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());

    writer.write_record([
        "Timestamp",
        "heart_rate",
        "breathing_rate",
        "temperature",
        "movement",
        "sound_level",
        "oxygen_saturation",
        "sleep_duration",
        "blood_pressure",
    ])?;

    let start = Utc::now().naive_utc() - ChronoDuration::minutes(count as i64);
    for i in 0..count {
        let reading = generator.generate(stress_rate);
        let timestamp = start + ChronoDuration::minutes(i as i64);

        let mut row = vec![timestamp.format("%Y-%m-%d %H:%M:%S").to_string()];
        row.extend(reading.to_array().iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
