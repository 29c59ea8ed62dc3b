use crate::generator::profile::GeneratorConfig;
use crate::Args;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use sweepcore::device::{DeviceSettings, GainSetting};
use sweepcore::math::window::WindowFunction;
use sweepcore::prelude::{
    AccumulationMode, DecimationMode, ScanConfig, DEFAULT_MAX_HOPS, DEFAULT_SETTLE_MS,
};
use sweepcore::units::{parse_duration, parse_percent, FrequencyRange};

/// Survey settings as written in a workflow file or on the command line.
///
/// Values keep their textual form (`88M:108M:125k`, `15m`, `20%`) until
/// [`WorkflowConfig::to_scan_config`] resolves them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub frequency: String,
    pub interval: String,
    pub single_shot: bool,
    pub exit_timer: Option<String>,
    pub crop: String,
    pub window: WindowFunction,
    /// Enables recursive decimation; 9 adds droop compensation.
    pub fir_size: Option<usize>,
    pub peak_hold: bool,
    pub max_hops: usize,
    pub settle_ms: u64,
    pub device: DeviceSettings,
    pub generator: GeneratorConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            frequency: String::new(),
            interval: "10s".into(),
            single_shot: false,
            exit_timer: None,
            crop: "0".into(),
            window: WindowFunction::Rectangle,
            fir_size: None,
            peak_hold: false,
            max_hops: DEFAULT_MAX_HOPS,
            settle_ms: DEFAULT_SETTLE_MS,
            device: DeviceSettings::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

fn whole_seconds(text: &str, what: &str) -> anyhow::Result<u64> {
    let secs = parse_duration(text).with_context(|| format!("parsing {} {:?}", what, text))?;
    if !secs.is_finite() || secs < 0.0 {
        bail!("{} {:?} must be a positive duration", what, text);
    }
    Ok(secs as u64)
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let window = args
            .window
            .parse::<WindowFunction>()
            .with_context(|| format!("selecting window {:?}", args.window))?;
        let gain = match args.gain {
            Some(db) => GainSetting::Manual {
                tenths_db: (db * 10.0).round() as i32,
            },
            None => GainSetting::Auto,
        };
        Ok(Self {
            frequency: args.frequency.clone().unwrap_or_default(),
            interval: args.interval.clone(),
            single_shot: args.single_shot,
            exit_timer: args.exit_timer.clone(),
            crop: args.crop.clone(),
            window,
            fir_size: args.fir_size,
            peak_hold: args.peak_hold,
            device: DeviceSettings {
                selector: args.device.clone(),
                gain,
                ppm: args.ppm,
                direct_sampling: args.direct_sampling,
                offset_tuning: args.offset_tuning,
            },
            ..Default::default()
        })
    }

    /// Report interval in whole seconds, usable without a frequency range.
    pub fn interval_secs(&self) -> anyhow::Result<u64> {
        whole_seconds(&self.interval, "interval")
    }

    /// Resolves units and validates the result without touching any device.
    pub fn to_scan_config(&self) -> anyhow::Result<ScanConfig> {
        if self.frequency.trim().is_empty() {
            bail!("no frequency range given, expected lower:upper:bin_size");
        }
        let range: FrequencyRange = self
            .frequency
            .parse()
            .with_context(|| format!("parsing frequency range {:?}", self.frequency))?;
        let crop = parse_percent(&self.crop)
            .with_context(|| format!("parsing crop {:?}", self.crop))?;

        let mut config = ScanConfig::new(range);
        config.crop = crop;
        config.interval_secs = self.interval_secs()?;
        config.single_shot = self.single_shot;
        config.exit_after_secs = self
            .exit_timer
            .as_deref()
            .map(|text| whole_seconds(text, "exit timer"))
            .transpose()?
            .filter(|&secs| secs > 0);
        config.window = self.window;
        config.decimation = match self.fir_size {
            Some(fir_size) => DecimationMode::Recursive { fir_size },
            None => DecimationMode::Boxcar,
        };
        config.accumulation = if self.peak_hold {
            AccumulationMode::PeakHold
        } else {
            AccumulationMode::Average
        };
        config.max_hops = self.max_hops;
        config.settle_ms = self.settle_ms;
        config.device = self.device.clone();
        config.validate().context("validating scan configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_resolves_classic_flags() {
        let args = Args::parse_from([
            "scanner", "-f", "88M:108M:125k", "-i", "1m", "-1", "-e", "2h", "-g", "29.7", "-w",
            "youssef", "-c", "20%", "-F", "9", "-P", "-d", "1234", "-p", "-3",
        ]);
        let cfg = WorkflowConfig::from_args(&args).unwrap();
        let scan = cfg.to_scan_config().unwrap();
        assert_eq!(scan.range.lower, 88_000_000);
        assert_eq!(scan.interval_secs, 60);
        assert!(scan.single_shot);
        assert_eq!(scan.exit_after_secs, Some(7200));
        assert_eq!(scan.window, WindowFunction::BlackmanHarrisPoisson);
        assert!((scan.crop - 0.2).abs() < 1e-12);
        assert_eq!(scan.decimation, DecimationMode::Recursive { fir_size: 9 });
        assert_eq!(scan.accumulation, AccumulationMode::PeakHold);
        assert_eq!(scan.device.selector, "1234");
        assert_eq!(scan.device.gain, GainSetting::Manual { tenths_db: 297 });
        assert_eq!(scan.device.ppm, -3);
    }

    #[test]
    fn zero_exit_timer_means_no_limit() {
        let args = Args::parse_from(["scanner", "-f", "88M:108M:125k", "-e", "0"]);
        let scan = WorkflowConfig::from_args(&args).unwrap().to_scan_config().unwrap();
        assert_eq!(scan.exit_after_secs, None);
    }

    #[test]
    fn interval_resolves_without_a_range() {
        let args = Args::parse_from(["scanner", "-i", "15m"]);
        let cfg = WorkflowConfig::from_args(&args).unwrap();
        assert!(cfg.to_scan_config().is_err());
        assert_eq!(cfg.interval_secs().unwrap(), 900);
    }

    #[test]
    fn kaiser_window_is_refused() {
        let args = Args::parse_from(["scanner", "-f", "88M:108M:125k", "-w", "kaiser"]);
        assert!(WorkflowConfig::from_args(&args).is_err());
    }

    #[test]
    fn missing_range_and_bad_crop_are_config_errors() {
        let cfg = WorkflowConfig::default();
        assert!(cfg.to_scan_config().is_err());
        let cfg = WorkflowConfig {
            frequency: "88M:108M:125k".into(),
            crop: "150%".into(),
            ..Default::default()
        };
        assert!(cfg.to_scan_config().is_err());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"frequency: 400M:450M:10k\ninterval: 30s\ncrop: '10%'\nwindow: hann-poisson\n\
peak_hold: true\ndevice:\n  selector: '0'\n  gain: !manual\n    tenths_db: 420\n\
generator:\n  carriers:\n    - frequency: 433.92M\n      amplitude: 20.0\n  noise: 0.5\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.window, WindowFunction::HannPoisson);
        assert_eq!(cfg.generator.carriers.len(), 1);
        let scan = cfg.to_scan_config().unwrap();
        assert_eq!(scan.interval_secs, 30);
        assert_eq!(scan.device.gain, GainSetting::Manual { tenths_db: 420 });
        assert_eq!(scan.accumulation, AccumulationMode::PeakHold);
        assert_eq!(scan.settle_ms, DEFAULT_SETTLE_MS);
    }
}
