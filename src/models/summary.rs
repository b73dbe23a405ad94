//! Batch aggregates behind the distribution, correlation and timeline charts

use crate::error::{InferenceError, Result};
use crate::feature_extractor::{FEATURE_COUNT, FEATURE_NAMES};
use crate::types::prediction::StressLabel;
use crate::types::reading::FeatureVector;
use crate::types::summary::{BatchSummary, CorrelationMatrix, LabelCounts, TimelinePoint};
use chrono::NaiveDateTime;

/// Summarize a labelled batch.
///
/// `labels` (and `timestamps`, when given) must line up with `rows`.
pub fn summarize(
    rows: &[FeatureVector],
    labels: &[StressLabel],
    timestamps: Option<&[Option<NaiveDateTime>]>,
) -> Result<BatchSummary> {
    if rows.is_empty() {
        return Err(InferenceError::EmptyBatch);
    }
    check_len(rows.len(), labels.len())?;

    let counts = count_labels(labels);
    let correlation = correlation_matrix(rows);
    let timeline = match timestamps {
        Some(ts) => {
            check_len(rows.len(), ts.len())?;
            Some(timeline(ts, labels))
        }
        None => None,
    };

    Ok(BatchSummary {
        counts,
        correlation,
        timeline,
    })
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(InferenceError::Shape { expected, actual });
    }
    Ok(())
}

/// Count High and Low labels
pub fn count_labels(labels: &[StressLabel]) -> LabelCounts {
    let mut counts = LabelCounts::default();
    for &label in labels {
        counts.record(label);
    }
    counts
}

/// Pearson correlation between every pair of feature columns
pub fn correlation_matrix(rows: &[FeatureVector]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = (0..FEATURE_COUNT)
        .map(|j| rows.iter().map(|r| r.to_array()[j]).collect())
        .collect();

    let mut values = vec![vec![None; FEATURE_COUNT]; FEATURE_COUNT];
    for i in 0..FEATURE_COUNT {
        for j in i..FEATURE_COUNT {
            let mut r = pearson(&columns[i], &columns[j]);
            if i == j {
                r = r.map(|_| 1.0);
            }
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        features: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        values,
    }
}

/// Pearson coefficient, `None` with fewer than two points or zero variance
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Labels ordered by timestamp; rows with equal timestamps keep input order.
///
/// Rows without a timestamp are skipped.
pub fn timeline(
    timestamps: &[Option<NaiveDateTime>],
    labels: &[StressLabel],
) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = timestamps
        .iter()
        .zip(labels)
        .filter_map(|(timestamp, &label)| {
            timestamp.map(|timestamp| TimelinePoint { timestamp, label })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn rows(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| {
                let mut v = FeatureVector::default();
                v.heart_rate = 60.0 + i as f64 * 10.0;
                v.blood_pressure = 100.0 + i as f64 * 5.0;
                v.sleep_duration = 9.0 - i as f64;
                v
            })
            .collect()
    }

    #[test]
    fn test_pearson() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_correlation_matrix() {
        let matrix = correlation_matrix(&rows(4));
        assert_eq!(matrix.size(), 8);

        let r = matrix.get("heart_rate", "blood_pressure").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = matrix.get("heart_rate", "sleep_duration").unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("heart_rate", "heart_rate"), Some(1.0));

        // Constant columns have no defined correlation
        assert_eq!(matrix.get("temperature", "heart_rate"), None);
        assert_eq!(matrix.get("temperature", "temperature"), None);
    }

    #[test]
    fn test_summarize_without_timestamps() {
        let labels = [StressLabel::High, StressLabel::Low, StressLabel::Low];
        let summary = summarize(&rows(3), &labels, None).unwrap();
        assert_eq!(summary.counts.high, 1);
        assert_eq!(summary.counts.low, 2);
        assert!(summary.timeline.is_none());
        assert!(summary.timeline_notice().is_some());
    }

    #[test]
    fn test_timeline_sorted_and_stable() {
        let labels = [
            StressLabel::High,
            StressLabel::Low,
            StressLabel::High,
            StressLabel::Low,
        ];
        let stamps = [Some(at(12)), Some(at(9)), Some(at(12)), Some(at(10))];
        let summary = summarize(&rows(4), &labels, Some(&stamps)).unwrap();
        let timeline = summary.timeline.unwrap();

        let hours: Vec<NaiveDateTime> = timeline.iter().map(|p| p.timestamp).collect();
        assert_eq!(hours, vec![at(9), at(10), at(12), at(12)]);
        let series: Vec<StressLabel> = timeline.iter().map(|p| p.label).collect();
        assert_eq!(
            series,
            vec![
                StressLabel::Low,
                StressLabel::Low,
                StressLabel::High,
                StressLabel::High
            ]
        );
    }

    #[test]
    fn test_timeline_skips_missing_timestamps() {
        let labels = [StressLabel::High, StressLabel::Low, StressLabel::Low];
        let stamps = [Some(at(11)), None, Some(at(8))];
        let summary = summarize(&rows(3), &labels, Some(&stamps)).unwrap();

        assert_eq!(summary.counts.total(), 3);
        let timeline = summary.timeline.unwrap();
        assert_eq!(
            timeline,
            vec![
                TimelinePoint {
                    timestamp: at(8),
                    label: StressLabel::Low,
                },
                TimelinePoint {
                    timestamp: at(11),
                    label: StressLabel::High,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_rejects_mismatch_and_empty() {
        assert!(matches!(
            summarize(&rows(3), &[StressLabel::Low], None),
            Err(InferenceError::Shape { expected: 3, actual: 1 })
        ));
        assert!(summarize(&[], &[], None).unwrap_err().is_empty_batch());
    }
}
