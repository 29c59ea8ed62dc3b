//! Tuner capability interface consumed by the scan loop.
//!
//! Real USB plumbing lives behind [`TunerDevice`]; the crate ships a
//! deterministic [`SyntheticDevice`] and a capture-backed [`ReplayDevice`].

pub mod replay;
pub mod setup;
pub mod synthetic;

pub use replay::ReplayDevice;
pub use setup::{configure_device, nearest_gain, select_device};
pub use synthetic::{Carrier, SyntheticDevice};

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("no supported devices found")]
    NoDevices,
    #[error("no device matches {0:?}")]
    NotFound(String),
    #[error("failed to open device #{0}")]
    Open(usize),
    #[error("failed to set {what} (code {code})")]
    Setting { what: &'static str, code: i32 },
    #[error("read failed: {0}")]
    Read(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainMode {
    Auto,
    Manual,
}

/// Requested tuner gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GainSetting {
    #[default]
    Auto,
    /// Gain in tenths of a dB, snapped to the nearest supported step.
    Manual { tenths_db: i32 },
}

/// Hardware-facing part of the scan configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub selector: String,
    pub gain: GainSetting,
    pub ppm: i32,
    pub direct_sampling: bool,
    pub offset_tuning: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            selector: "0".into(),
            gain: GainSetting::Auto,
            ppm: 0,
            direct_sampling: false,
            offset_tuning: false,
        }
    }
}

/// USB identity of an attached tuner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub vendor: String,
    pub product: String,
    pub serial: String,
}

/// Operations the survey needs from a tuner. Closing happens on drop.
pub trait TunerDevice {
    fn set_center_frequency(&mut self, hz: u32) -> DeviceResult<()>;
    fn center_frequency(&self) -> u32;
    fn set_sample_rate(&mut self, hz: u32) -> DeviceResult<()>;
    fn sample_rate(&self) -> u32;
    fn set_gain_mode(&mut self, mode: GainMode) -> DeviceResult<()>;
    fn set_gain(&mut self, tenths_db: i32) -> DeviceResult<()>;
    fn reset_buffer(&mut self) -> DeviceResult<()>;
    /// Blocks until `buf` is filled or the transfer ends; returns bytes read.
    fn read_sync(&mut self, buf: &mut [u8]) -> DeviceResult<usize>;

    /// Supported gains in tenths of a dB.
    fn tuner_gains(&self) -> Vec<i32> {
        Vec::new()
    }

    fn set_frequency_correction(&mut self, _ppm: i32) -> DeviceResult<()> {
        Ok(())
    }

    fn set_direct_sampling(&mut self, _enabled: bool) -> DeviceResult<()> {
        Ok(())
    }

    fn set_offset_tuning(&mut self, _enabled: bool) -> DeviceResult<()> {
        Ok(())
    }
}

impl<D: TunerDevice + ?Sized> TunerDevice for Box<D> {
    fn set_center_frequency(&mut self, hz: u32) -> DeviceResult<()> {
        (**self).set_center_frequency(hz)
    }

    fn center_frequency(&self) -> u32 {
        (**self).center_frequency()
    }

    fn set_sample_rate(&mut self, hz: u32) -> DeviceResult<()> {
        (**self).set_sample_rate(hz)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn set_gain_mode(&mut self, mode: GainMode) -> DeviceResult<()> {
        (**self).set_gain_mode(mode)
    }

    fn set_gain(&mut self, tenths_db: i32) -> DeviceResult<()> {
        (**self).set_gain(tenths_db)
    }

    fn reset_buffer(&mut self) -> DeviceResult<()> {
        (**self).reset_buffer()
    }

    fn read_sync(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        (**self).read_sync(buf)
    }

    fn tuner_gains(&self) -> Vec<i32> {
        (**self).tuner_gains()
    }

    fn set_frequency_correction(&mut self, ppm: i32) -> DeviceResult<()> {
        (**self).set_frequency_correction(ppm)
    }

    fn set_direct_sampling(&mut self, enabled: bool) -> DeviceResult<()> {
        (**self).set_direct_sampling(enabled)
    }

    fn set_offset_tuning(&mut self, enabled: bool) -> DeviceResult<()> {
        (**self).set_offset_tuning(enabled)
    }
}

/// Enumerates and opens tuners.
pub trait DeviceCatalog {
    fn devices(&self) -> Vec<DeviceInfo>;
    fn open(&self, index: usize) -> DeviceResult<Box<dyn TunerDevice>>;
}
