use crate::prelude::{ScanError, ScanResult};
use std::fmt;
use std::str::FromStr;

/// Number of comma separated fields the timestamp occupies (`date, time`).
pub const TIMESTAMP_FIELDS: usize = 2;

/// One line of the report stream: a hop's retained bins for one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub timestamp: String,
    pub low: i64,
    pub high: i64,
    pub step: f64,
    pub samples: u64,
    pub dbm: Vec<f64>,
}

impl ReportRow {
    /// Center frequency of bin `index` within the row.
    pub fn bin_frequency(&self, index: usize) -> f64 {
        self.low as f64 + self.step * index as f64
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {:.2}, {}",
            self.timestamp, self.low, self.high, self.step, self.samples
        )?;
        for value in &self.dbm {
            write!(f, ", {:.2}", value)?;
        }
        Ok(())
    }
}

fn field<T: FromStr>(fields: &[&str], index: usize, name: &str) -> ScanResult<T> {
    let text = fields
        .get(index)
        .ok_or_else(|| ScanError::Format(format!("missing {} field", name)))?;
    text.parse()
        .map_err(|_| ScanError::Format(format!("bad {} field: {:?}", name, text)))
}

impl FromStr for ReportRow {
    type Err = ScanError;

    fn from_str(line: &str) -> ScanResult<Self> {
        let fields: Vec<&str> = line.trim_end().split(',').map(str::trim).collect();
        if fields.len() < TIMESTAMP_FIELDS + 4 {
            return Err(ScanError::Format(format!(
                "expected at least {} fields, got {}",
                TIMESTAMP_FIELDS + 4,
                fields.len()
            )));
        }
        let timestamp = fields[..TIMESTAMP_FIELDS].join(", ");
        let rest = &fields[TIMESTAMP_FIELDS..];
        let dbm = rest[4..]
            .iter()
            .filter(|text| !text.is_empty())
            .map(|text| {
                text.parse::<f64>()
                    .map_err(|_| ScanError::Format(format!("bad power value: {:?}", text)))
            })
            .collect::<ScanResult<Vec<_>>>()?;
        Ok(Self {
            timestamp,
            low: field(rest, 0, "low frequency")?,
            high: field(rest, 1, "high frequency")?,
            step: field(rest, 2, "step")?,
            samples: field(rest, 3, "samples")?,
            dbm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ReportRow {
        ReportRow {
            timestamp: "2024-05-01, 12:00:00".into(),
            low: 88_000_000,
            high: 90_500_000,
            step: 78_125.0,
            samples: 256,
            dbm: vec![-12.5, -30.25, -7.0],
        }
    }

    #[test]
    fn row_text_layout() {
        assert_eq!(
            sample_row().to_string(),
            "2024-05-01, 12:00:00, 88000000, 90500000, 78125.00, 256, -12.50, -30.25, -7.00"
        );
    }

    #[test]
    fn row_parses_back() {
        let parsed: ReportRow = sample_row().to_string().parse().unwrap();
        assert_eq!(parsed, sample_row());
        assert_eq!(parsed.bin_frequency(2), 88_156_250.0);
    }

    #[test]
    fn non_finite_power_survives_parsing() {
        let parsed: ReportRow = "2024-05-01, 12:00:00, 1, 2, 0.50, 0, -inf, NaN"
            .parse()
            .unwrap();
        assert_eq!(parsed.dbm[0], f64::NEG_INFINITY);
        assert!(parsed.dbm[1].is_nan());
    }

    #[test]
    fn truncated_rows_are_rejected() {
        let err = "2024-05-01, 12:00:00, 1, 2".parse::<ReportRow>().unwrap_err();
        assert!(matches!(err, ScanError::Format(_)));
        assert!("a, b, x, 2, 3.0, 4".parse::<ReportRow>().is_err());
    }
}
