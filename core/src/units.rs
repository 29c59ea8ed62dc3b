//! Suffix-aware number parsing for frequencies, durations and percentages.

use crate::prelude::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn parse_number(text: &str) -> ScanResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| ScanError::InvalidConfig(format!("not a number: {:?}", text)))
}

fn split_suffix(text: &str) -> (&str, Option<char>) {
    match text.chars().last() {
        Some(last) if last.is_ascii_alphabetic() || last == '%' => {
            (&text[..text.len() - last.len_utf8()], Some(last))
        }
        _ => (text, None),
    }
}

/// Parses `125k`, `88M`, `1.2G` or a plain number of hertz.
pub fn parse_frequency(text: &str) -> ScanResult<f64> {
    let text = text.trim();
    let (number, suffix) = split_suffix(text);
    let scale = match suffix {
        None => 1.0,
        Some('k') | Some('K') => 1e3,
        Some('m') | Some('M') => 1e6,
        Some('g') | Some('G') => 1e9,
        Some(other) => {
            return Err(ScanError::InvalidConfig(format!(
                "unknown frequency suffix {:?} in {:?}",
                other, text
            )))
        }
    };
    Ok(parse_number(number)? * scale)
}

/// Parses `30s`, `15m`, `1h` or a plain number of seconds.
pub fn parse_duration(text: &str) -> ScanResult<f64> {
    let text = text.trim();
    let (number, suffix) = split_suffix(text);
    let scale = match suffix {
        None | Some('s') | Some('S') => 1.0,
        Some('m') | Some('M') => 60.0,
        Some('h') | Some('H') => 3600.0,
        Some(other) => {
            return Err(ScanError::InvalidConfig(format!(
                "unknown time suffix {:?} in {:?}",
                other, text
            )))
        }
    };
    Ok(parse_number(number)? * scale)
}

/// Parses `20%` as 0.2; a bare number is taken as a fraction already.
pub fn parse_percent(text: &str) -> ScanResult<f64> {
    let text = text.trim();
    match text.strip_suffix('%') {
        Some(number) => Ok(parse_number(number)? * 0.01),
        None => parse_number(text),
    }
}

fn to_hertz(value: f64, what: &str) -> ScanResult<u32> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(ScanError::InvalidConfig(format!(
            "{} {} out of range",
            what, value
        )));
    }
    Ok(value.round() as u32)
}

/// Requested survey span and the largest acceptable bin width, all in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub lower: u32,
    pub upper: u32,
    pub max_bin_size: u32,
}

impl FrequencyRange {
    pub fn new(lower: u32, upper: u32, max_bin_size: u32) -> Self {
        Self {
            lower,
            upper,
            max_bin_size,
        }
    }

    pub fn span(&self) -> u32 {
        self.upper.saturating_sub(self.lower)
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.upper <= self.lower {
            return Err(ScanError::InvalidConfig(format!(
                "upper frequency {} must exceed lower frequency {}",
                self.upper, self.lower
            )));
        }
        if self.max_bin_size == 0 {
            return Err(ScanError::InvalidConfig("bin size must be at least 1 Hz".into()));
        }
        Ok(())
    }
}

impl FromStr for FrequencyRange {
    type Err = ScanError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 3 {
            return Err(ScanError::InvalidConfig(format!(
                "expected lower:upper:bin_size, got {:?}",
                text
            )));
        }
        let range = FrequencyRange {
            lower: to_hertz(parse_frequency(parts[0])?, "lower frequency")?,
            upper: to_hertz(parse_frequency(parts[1])?, "upper frequency")?,
            max_bin_size: to_hertz(parse_frequency(parts[2])?, "bin size")?,
        };
        range.validate()?;
        Ok(range)
    }
}

impl fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.lower, self.upper, self.max_bin_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_suffixes_scale() {
        assert_eq!(parse_frequency("125k").unwrap(), 125_000.0);
        assert_eq!(parse_frequency("88M").unwrap(), 88_000_000.0);
        assert_eq!(parse_frequency("1.2G").unwrap(), 1_200_000_000.0);
        assert_eq!(parse_frequency("440").unwrap(), 440.0);
        assert!(parse_frequency("12x").is_err());
    }

    #[test]
    fn duration_suffixes_scale() {
        assert_eq!(parse_duration("15m").unwrap(), 900.0);
        assert_eq!(parse_duration("1h").unwrap(), 3600.0);
        assert_eq!(parse_duration("10").unwrap(), 10.0);
        assert_eq!(parse_duration("30s").unwrap(), 30.0);
    }

    #[test]
    fn percent_is_fractional() {
        assert!((parse_percent("20%").unwrap() - 0.2).abs() < 1e-12);
        assert!((parse_percent("0.5").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn range_parses_and_round_trips_through_display() {
        let range: FrequencyRange = "88M:108M:125k".parse().unwrap();
        assert_eq!(range, FrequencyRange::new(88_000_000, 108_000_000, 125_000));
        assert_eq!(range.span(), 20_000_000);
        assert_eq!(range.to_string().parse::<FrequencyRange>().unwrap(), range);
    }

    #[test]
    fn inverted_or_incomplete_ranges_are_rejected() {
        assert!("108M:88M:125k".parse::<FrequencyRange>().is_err());
        assert!("88M:108M".parse::<FrequencyRange>().is_err());
        assert!("88M:108M:0".parse::<FrequencyRange>().is_err());
    }
}
