//! Bulk prediction over uploaded CSV tables.
//!
//! Feature columns are matched by header name, so uploads may order them
//! freely and carry extra columns. Extra columns are passed through to the
//! output untouched, followed by the label column. An upload that already
//! has a `Stress Level` column gets it overwritten rather than duplicated.

use crate::error::{InferenceError, Result};
use crate::feature_extractor::{normalize_header, ColumnMapping, FeatureExtractor};
use crate::models::inference::InferenceService;
use crate::types::prediction::StressLabel;
use crate::types::reading::FeatureVector;
use crate::types::summary::BatchSummary;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Header of the appended label column
pub const LABEL_COLUMN: &str = "Stress Level";

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a timestamp cell: RFC 3339, common date-time layouts, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A parsed upload: the raw table plus the validated readings.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub readings: Vec<FeatureVector>,
    /// Present only when the upload has a timestamp column; blank cells are `None`
    pub timestamps: Option<Vec<Option<NaiveDateTime>>>,
}

impl BatchInput {
    /// Read an upload from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading batch upload");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read an upload from any CSV source.
    ///
    /// A source with no data rows, or no content at all, is an `EmptyBatch`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Err(InferenceError::EmptyBatch);
        }

        let mapping = ColumnMapping::from_headers(headers.iter())?;
        let extractor = FeatureExtractor::new();

        let readings = records
            .iter()
            .enumerate()
            .map(|(i, record)| extractor.extract_record(record, &mapping, i + 1))
            .collect::<Result<Vec<_>>>()?;

        let timestamps = match mapping.timestamp_column {
            Some(column) => Some(
                records
                    .iter()
                    .enumerate()
                    .map(|(i, record)| {
                        let raw = record.get(column).unwrap_or("").trim();
                        if raw.is_empty() {
                            return Ok(None);
                        }
                        parse_timestamp(raw).map(Some).ok_or_else(|| {
                            InferenceError::InvalidTimestamp {
                                row: i + 1,
                                value: raw.to_string(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        debug!(
            rows = records.len(),
            columns = headers.len(),
            has_timestamp = timestamps.is_some(),
            "Batch upload parsed"
        );

        Ok(Self {
            headers,
            records,
            readings,
            timestamps,
        })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// The upload with one label appended per row, in input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub labels: Vec<StressLabel>,
}

impl BatchResult {
    /// Index of an existing label column in the upload, if any
    pub fn label_column(&self) -> Option<usize> {
        let key = normalize_header(LABEL_COLUMN);
        self.headers.iter().position(|h| normalize_header(h) == key)
    }

    /// Write the labelled table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        let label_column = self.label_column();

        let mut headers = self.headers.clone();
        if label_column.is_none() {
            headers.push_field(LABEL_COLUMN);
        }
        writer.write_record(&headers)?;

        for (record, label) in self.records.iter().zip(&self.labels) {
            writer.write_record(&with_label(record, label_column, *label))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the labelled table to a file
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(file)?;
        info!(path = %path.as_ref().display(), rows = self.labels.len(), "Batch result written");
        Ok(())
    }
}

fn with_label(record: &StringRecord, column: Option<usize>, label: StressLabel) -> StringRecord {
    match column {
        Some(column) => record
            .iter()
            .enumerate()
            .map(|(i, field)| if i == column { label.as_str() } else { field })
            .collect(),
        None => {
            let mut row = record.clone();
            row.push_field(label.as_str());
            row
        }
    }
}

/// Labelled table plus the aggregates for its charts
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub result: BatchResult,
    pub summary: BatchSummary,
}

/// Classify and summarize a parsed upload
pub fn process_batch(service: &InferenceService, input: BatchInput) -> Result<BatchReport> {
    if input.is_empty() {
        return Err(InferenceError::EmptyBatch);
    }
    debug!(rows = input.len(), "Classifying batch");

    let labels = service.predict_batch(&input.readings)?;
    let summary = service.summarize(&input.readings, &labels, input.timestamps.as_deref())?;

    info!(
        rows = labels.len(),
        high = summary.counts.high,
        low = summary.counts.low,
        timeline = summary.timeline.is_some(),
        "Batch processed"
    );

    Ok(BatchReport {
        result: BatchResult {
            headers: input.headers,
            records: input.records,
            labels,
        },
        summary,
    })
}
