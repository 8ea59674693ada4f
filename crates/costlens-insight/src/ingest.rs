//! Cost record ingestion from JSONL exports.
//!
//! Billing exports arrive as one JSON object per line. Each line carries
//! `service`, `provider`, `amount`, and `date`, with optional `project` and
//! `environment` fields that fall back to the store defaults. Lines that fail
//! validation are skipped with a warning rather than aborting the import.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{InsightError, Result};
use crate::models::CostRecord;

/// A single line of a JSONL billing export, before validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    service: String,
    provider: String,
    amount: f64,
    date: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    environment: Option<String>,
}

/// Result of importing a JSONL file.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// Records that passed validation, in file order.
    pub records: Vec<CostRecord>,

    /// Number of lines rejected by validation.
    pub skipped: usize,
}

/// Reads cost records from JSONL billing exports.
pub struct RecordImporter;

impl RecordImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parses a JSONL export file into validated cost records.
    ///
    /// Blank lines are ignored. Lines that are not valid JSON, or that carry
    /// a negative amount or a date not in `YYYY-MM-DD` form, are counted as
    /// skipped and logged. An unreadable file is an error; a bad line is not.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportBatch> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Importing cost records");

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping unreadable line");
                    skipped += 1;
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match self.parse_line(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping invalid record");
                    skipped += 1;
                }
            }
        }

        info!(
            path = %path.display(),
            imported = records.len(),
            skipped,
            "Parsed cost record export"
        );

        Ok(ImportBatch { records, skipped })
    }

    /// Parses and validates a single JSONL line.
    pub fn parse_line(&self, line: &str) -> Result<CostRecord> {
        let raw: RawRecord = serde_json::from_str(line)
            .map_err(|e| InsightError::InvalidRecordFormat(e.to_string()))?;

        if !raw.amount.is_finite() || raw.amount < 0.0 {
            return Err(InsightError::InvalidAmount {
                value: raw.amount.to_string(),
            });
        }

        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
            .map_err(|_| InsightError::InvalidDate { value: raw.date.clone() })?;

        let mut record = CostRecord::new(raw.service, raw.provider, raw.amount, date);
        if let Some(project) = raw.project {
            record = record.with_project(project);
        }
        if let Some(environment) = raw.environment {
            record = record.with_environment(environment);
        }

        Ok(record)
    }
}

impl Default for RecordImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_line_full_record() {
        let importer = RecordImporter::new();
        let line = r#"{"service":"EC2","provider":"AWS","amount":42.5,"date":"2025-06-10","project":"Project Alpha","environment":"Staging"}"#;

        let record = importer.parse_line(line).unwrap();
        assert_eq!(record.service, "EC2");
        assert_eq!(record.provider, "AWS");
        assert!((record.amount - 42.5).abs() < 0.0001);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert_eq!(record.project, "Project Alpha");
        assert_eq!(record.environment, "Staging");
    }

    #[test]
    fn test_parse_line_applies_defaults() {
        let importer = RecordImporter::new();
        let line = r#"{"service":"S3","provider":"AWS","amount":3.2,"date":"2025-06-01"}"#;

        let record = importer.parse_line(line).unwrap();
        assert_eq!(record.project, "Main Project");
        assert_eq!(record.environment, "Production");
    }

    #[test]
    fn test_parse_line_rejects_negative_amount() {
        let importer = RecordImporter::new();
        let line = r#"{"service":"S3","provider":"AWS","amount":-1.0,"date":"2025-06-01"}"#;

        let err = importer.parse_line(line).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, InsightError::InvalidAmount { .. }));
    }

    #[test]
    fn test_parse_line_rejects_bad_date() {
        let importer = RecordImporter::new();
        let line = r#"{"service":"S3","provider":"AWS","amount":1.0,"date":"06/01/2025"}"#;

        let err = importer.parse_line(line).unwrap_err();
        assert!(matches!(err, InsightError::InvalidDate { ref value } if value == "06/01/2025"));
    }

    #[test]
    fn test_parse_line_rejects_malformed_json() {
        let importer = RecordImporter::new();

        let err = importer.parse_line("not json at all").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, InsightError::InvalidRecordFormat(_)));
    }

    #[test]
    fn test_parse_file_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"service":"EC2","provider":"AWS","amount":10.0,"date":"2025-06-01"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, "garbage line").unwrap();
        writeln!(
            file,
            r#"{{"service":"RDS","provider":"AWS","amount":-5.0,"date":"2025-06-02"}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"service":"Cloud SQL","provider":"GCP","amount":7.5,"date":"2025-06-03"}}"#
        )
        .unwrap();

        let importer = RecordImporter::new();
        let batch = importer.parse_file(file.path()).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.records[0].service, "EC2");
        assert_eq!(batch.records[1].service, "Cloud SQL");
    }

    #[test]
    fn test_parse_file_missing_file_is_error() {
        let importer = RecordImporter::new();
        let result = importer.parse_file("/nonexistent/billing.jsonl");
        assert!(result.is_err());
    }
}
