//! JSON export of a report stream, grouped by report interval.

use super::row::TIMESTAMP_FIELDS;
use super::{ReportRow, ReportSink};
use crate::prelude::{ScanError, ScanResult};
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub frequency: i64,
    /// `None` when the bin had no finite power (empty interval or silent bin).
    pub dbm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub frequency_low: i64,
    pub frequency_high: i64,
    pub frequency_step: f64,
    pub metric_values: Vec<MetricValue>,
}

impl From<&ReportRow> for MetricSeries {
    fn from(row: &ReportRow) -> Self {
        Self {
            frequency_low: row.low,
            frequency_high: row.high,
            frequency_step: row.step,
            metric_values: row
                .dbm
                .iter()
                .enumerate()
                .map(|(k, &value)| MetricValue {
                    frequency: row.bin_frequency(k).round() as i64,
                    dbm: value.is_finite().then_some(value),
                })
                .collect(),
        }
    }
}

/// Every row sharing one report timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub unix_timestamp: i64,
    pub timestamp: String,
    pub total_samples: u64,
    pub metric_series: Vec<MetricSeries>,
}

/// A batch of integrations ordered by time, ready for JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationLog {
    #[serde(rename = "BATCH_ID")]
    pub batch_id: String,
    pub integration_interval: u64,
    pub integrations: Vec<Integration>,
}

/// Seconds since the epoch for a report timestamp read as local time.
pub fn unix_timestamp(timestamp: &str) -> ScanResult<i64> {
    let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|err| ScanError::Format(format!("bad timestamp {:?}: {}", timestamp, err)))?;
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc().timestamp(), |at| at.timestamp()))
}

impl IntegrationLog {
    pub fn new(batch_id: impl Into<String>, integration_interval: u64) -> Self {
        Self {
            batch_id: batch_id.into(),
            integration_interval,
            integrations: Vec::new(),
        }
    }

    /// Rebuilds the log from a report file, skipping blank lines.
    pub fn from_csv(
        reader: impl BufRead,
        batch_id: impl Into<String>,
        integration_interval: u64,
    ) -> ScanResult<Self> {
        let mut log = Self::new(batch_id, integration_interval);
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: ReportRow = line.parse().map_err(|err| match err {
                ScanError::Format(msg) => {
                    ScanError::Format(format!("line {}: {}", number + 1, msg))
                }
                other => other,
            })?;
            log.push(&row)?;
        }
        Ok(log)
    }

    /// Adds a row to the integration for its timestamp, creating it if needed.
    pub fn push(&mut self, row: &ReportRow) -> ScanResult<()> {
        if row.timestamp.split(',').count() != TIMESTAMP_FIELDS {
            return Err(ScanError::Format(format!(
                "timestamp {:?} is not a date, time pair",
                row.timestamp
            )));
        }
        let unix = unix_timestamp(&row.timestamp)?;
        let series = MetricSeries::from(row);
        match self
            .integrations
            .binary_search_by_key(&unix, |i| i.unix_timestamp)
        {
            Ok(found) => self.integrations[found].metric_series.push(series),
            Err(slot) => self.integrations.insert(
                slot,
                Integration {
                    unix_timestamp: unix,
                    timestamp: row.timestamp.clone(),
                    total_samples: row.samples,
                    metric_series: vec![series],
                },
            ),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    pub fn to_json(&self) -> ScanResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| ScanError::Format(err.to_string()))
    }

    pub fn write_json(&self, mut writer: impl Write) -> ScanResult<()> {
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|err| ScanError::Format(err.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

impl ReportSink for IntegrationLog {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        self.push(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom};

    const REPORT: &str = "\
2024-05-01, 12:00:10, 88000000, 90500000, 78125.00, 256, -10.00, -20.00
2024-05-01, 12:00:10, 90500000, 93000000, 78125.00, 256, -11.00, -inf

2024-05-01, 12:00:00, 88000000, 90500000, 78125.00, 128, -12.00, -22.00
";

    #[test]
    fn rows_group_by_timestamp_in_time_order() {
        let log = IntegrationLog::from_csv(Cursor::new(REPORT), "batch-7", 10).unwrap();
        assert_eq!(log.len(), 2);
        let first = &log.integrations[0];
        let second = &log.integrations[1];
        assert_eq!(first.timestamp, "2024-05-01, 12:00:00");
        assert_eq!(second.unix_timestamp - first.unix_timestamp, 10);
        assert_eq!(first.total_samples, 128);
        assert_eq!(second.metric_series.len(), 2);
        let values = &second.metric_series[1].metric_values;
        assert_eq!(values[0].frequency, 90_500_000);
        assert_eq!(values[1].frequency, 90_578_125);
        assert_eq!(values[1].dbm, None);
    }

    #[test]
    fn json_uses_camel_case_and_batch_header() {
        let log = IntegrationLog::from_csv(Cursor::new(REPORT), "batch-7", 10).unwrap();
        let json = log.to_json().unwrap();
        assert!(json.contains("\"BATCH_ID\": \"batch-7\""));
        assert!(json.contains("\"integrationInterval\": 10"));
        assert!(json.contains("\"frequencyLow\": 88000000"));
        assert!(json.contains("\"metricValues\""));
        let back: IntegrationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn malformed_lines_name_their_position() {
        let err = IntegrationLog::from_csv(Cursor::new("2024-05-01, 12:00:00, x\n"), "b", 1)
            .unwrap_err();
        match err {
            ScanError::Format(msg) => assert!(msg.starts_with("line 1")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn json_is_written_to_a_file() {
        let mut log = IntegrationLog::new("live", 5);
        for line in REPORT.lines().filter(|l| !l.is_empty()) {
            log.emit(&line.parse().unwrap()).unwrap();
        }
        let mut file = tempfile::tempfile().unwrap();
        log.write_json(&mut file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let back: IntegrationLog = serde_json::from_reader(file).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.batch_id, "live");
    }
}
