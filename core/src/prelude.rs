use crate::device::{DeviceError, DeviceSettings};
use crate::math::window::WindowFunction;
use crate::units::FrequencyRange;
use serde::{Deserialize, Serialize};

/// Hop-count ceiling applied when the configuration does not override it.
pub const DEFAULT_MAX_HOPS: usize = 3000;

/// Settle time after a retune before the flush read.
pub const DEFAULT_SETTLE_MS: u64 = 5;

/// Common error type for planning, acquisition and reporting.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("bandwidth too wide: no hop count fits the device rate")]
    BandwidthTooWide,
    #[error("plan needs {hops} hops, ceiling is {limit}")]
    TooManyHops { hops: usize, limit: usize },
    #[error("frequency range produced an empty plan")]
    EmptyPlan,
    #[error("could not allocate {what} of {len} elements")]
    Allocation { what: &'static str, len: usize },
    #[error("FFT length {length} exceeds sine table capacity {capacity}")]
    FftTooLarge { length: usize, capacity: usize },
    #[error("unsupported window function: {0}")]
    UnsupportedWindow(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("report sink failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed report data: {0}")]
    Format(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

/// How per-bin power is folded across sweeps within one report interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulationMode {
    #[default]
    Average,
    PeakHold,
}

/// Decimation strategy for hops that oversample the requested bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecimationMode {
    /// Grouped summation of consecutive I/Q pairs.
    #[default]
    Boxcar,
    /// Repeated half-band passes. `fir_size` 9 enables droop compensation, 0 disables it.
    Recursive { fir_size: usize },
}

impl DecimationMode {
    pub fn is_boxcar(&self) -> bool {
        matches!(self, DecimationMode::Boxcar)
    }

    pub fn droop_compensated(&self) -> bool {
        matches!(self, DecimationMode::Recursive { fir_size: 9 })
    }
}

/// Fully resolved scan configuration consumed by the planner and scan loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub range: FrequencyRange,
    pub crop: f64,
    pub interval_secs: u64,
    pub single_shot: bool,
    pub exit_after_secs: Option<u64>,
    pub window: WindowFunction,
    pub decimation: DecimationMode,
    pub accumulation: AccumulationMode,
    pub max_hops: usize,
    pub settle_ms: u64,
    pub device: DeviceSettings,
}

impl ScanConfig {
    pub fn new(range: FrequencyRange) -> Self {
        Self {
            range,
            crop: 0.0,
            interval_secs: 10,
            single_shot: false,
            exit_after_secs: None,
            window: WindowFunction::Rectangle,
            decimation: DecimationMode::Boxcar,
            accumulation: AccumulationMode::Average,
            max_hops: DEFAULT_MAX_HOPS,
            settle_ms: DEFAULT_SETTLE_MS,
            device: DeviceSettings::default(),
        }
    }

    /// Rejects configurations that must never reach the hardware.
    pub fn validate(&self) -> ScanResult<()> {
        if !(0.0..=1.0).contains(&self.crop) {
            return Err(ScanError::InvalidConfig(format!(
                "crop value {} outside of 0 to 1",
                self.crop
            )));
        }
        self.range.validate()?;
        if let DecimationMode::Recursive { fir_size } = self.decimation {
            if fir_size != 0 && fir_size != 9 {
                return Err(ScanError::InvalidConfig(format!(
                    "fir size {} unsupported, use 0 or 9",
                    fir_size
                )));
            }
        }
        if self.max_hops == 0 {
            return Err(ScanError::InvalidConfig("hop ceiling must be positive".into()));
        }
        Ok(())
    }

    /// Report interval in seconds, never below one.
    pub fn interval(&self) -> u64 {
        self.interval_secs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fm_band() -> FrequencyRange {
        "88M:108M:125k".parse().unwrap()
    }

    #[test]
    fn crop_outside_unit_interval_is_rejected() {
        let mut config = ScanConfig::new(fm_band());
        config.crop = 1.5;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));
        config.crop = -0.1;
        assert!(config.validate().is_err());
        config.crop = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn only_nine_tap_droop_filter_is_accepted() {
        let mut config = ScanConfig::new(fm_band());
        config.decimation = DecimationMode::Recursive { fir_size: 7 };
        assert!(config.validate().is_err());
        config.decimation = DecimationMode::Recursive { fir_size: 9 };
        assert!(config.validate().is_ok());
        assert!(config.decimation.droop_compensated());
    }

    #[test]
    fn interval_is_clamped_to_one_second() {
        let mut config = ScanConfig::new(fm_band());
        config.interval_secs = 0;
        assert_eq!(config.interval(), 1);
    }
}
