//! Request and label statistics for the inference service.

use crate::types::prediction::StressLabel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile computation
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for served predictions
pub struct ServiceMetrics {
    /// Requests answered with labels
    pub requests_served: AtomicU64,
    /// Requests rejected with an error
    pub requests_rejected: AtomicU64,
    /// Rows classified across all requests
    pub rows_classified: AtomicU64,
    high_labels: AtomicU64,
    low_labels: AtomicU64,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            rows_classified: AtomicU64::new(0),
            high_labels: AtomicU64::new(0),
            low_labels: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully answered request
    pub fn record_request(&self, latency: Duration, labels: &[StressLabel]) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.rows_classified
            .fetch_add(labels.len() as u64, Ordering::Relaxed);

        let high = labels.iter().filter(|&&l| l == StressLabel::High).count() as u64;
        self.high_labels.fetch_add(high, Ordering::Relaxed);
        self.low_labels
            .fetch_add(labels.len() as u64 - high, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    /// Record a rejected request
    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// High and Low label totals
    pub fn label_totals(&self) -> (u64, u64) {
        (
            self.high_labels.load(Ordering::Relaxed),
            self.low_labels.load(Ordering::Relaxed),
        )
    }

    /// Latency statistics over the retained samples
    pub fn get_latency_stats(&self) -> LatencyStats {
        let sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return LatencyStats::default(),
        };

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Rows classified per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.rows_classified.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.requests_served.load(Ordering::Relaxed);
        let rejected = self.requests_rejected.load(Ordering::Relaxed);
        let rows = self.rows_classified.load(Ordering::Relaxed);
        let (high, low) = self.label_totals();
        let high_pct = if rows > 0 {
            high as f64 / rows as f64 * 100.0
        } else {
            0.0
        };
        let latency = self.get_latency_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             STRESS INFERENCE SERVICE - SUMMARY               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests served: {:>8}  │  Rejected: {:>8}              ║",
            served, rejected
        );
        info!(
            "║ Rows classified: {:>8}  │  Throughput: {:>8.1} rows/s     ║",
            rows,
            self.get_throughput()
        );
        info!(
            "║ High stress: {:>8} ({:>5.1}%)  │  Low stress: {:>8}         ║",
            high, high_pct, low
        );
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}      ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Prints periodic metrics summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_request(
            Duration::from_micros(100),
            &[StressLabel::High, StressLabel::Low, StressLabel::Low],
        );
        metrics.record_request(Duration::from_micros(300), &[StressLabel::High]);
        metrics.record_rejection();

        assert_eq!(metrics.requests_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rows_classified.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.label_totals(), (2, 2));
    }

    #[test]
    fn test_latency_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_latency_stats().count, 0);

        for us in [100u64, 200, 300, 400] {
            metrics.record_request(Duration::from_micros(us), &[StressLabel::Low]);
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }
}
