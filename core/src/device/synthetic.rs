use super::{DeviceError, DeviceResult, GainMode, TunerDevice};
use crate::math::stats::SAMPLE_OFFSET;
use std::f64::consts::PI;

/// Gain steps of an R820T tuner, tenths of a dB.
const R820T_GAINS: [i32; 29] = [
    0, 9, 14, 27, 37, 77, 87, 125, 144, 157, 166, 197, 207, 229, 254, 280, 297, 328, 338, 364,
    372, 386, 402, 421, 434, 439, 445, 480, 496,
];

/// A continuous-wave signal present on the simulated air.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Carrier {
    pub frequency: u32,
    /// Peak amplitude in 8-bit sample counts.
    pub amplitude: f64,
}

type NoiseSource = Box<dyn FnMut() -> f64 + Send>;

/// Tuner that synthesizes 8-bit I/Q for a fixed set of carriers.
pub struct SyntheticDevice {
    carriers: Vec<Carrier>,
    center: u32,
    rate: u32,
    gain_mode: GainMode,
    gain: Option<i32>,
    ppm: i32,
    sample_index: u64,
    read_limit: Option<usize>,
    retunes: usize,
    noise: Option<NoiseSource>,
}

impl SyntheticDevice {
    pub fn new(carriers: Vec<Carrier>) -> Self {
        Self {
            carriers,
            center: 0,
            rate: 0,
            gain_mode: GainMode::Auto,
            gain: None,
            ppm: 0,
            sample_index: 0,
            read_limit: None,
            retunes: 0,
            noise: None,
        }
    }

    /// Adds a per-sample noise term, in sample counts, to both rails.
    pub fn with_noise(mut self, noise: impl FnMut() -> f64 + Send + 'static) -> Self {
        self.noise = Some(Box::new(noise));
        self
    }

    /// Caps every read at `limit` bytes to simulate dropped samples.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }

    pub fn gain(&self) -> Option<i32> {
        match self.gain_mode {
            GainMode::Auto => None,
            GainMode::Manual => self.gain,
        }
    }

    pub fn frequency_correction(&self) -> i32 {
        self.ppm
    }

    /// Number of center-frequency changes so far.
    pub fn retunes(&self) -> usize {
        self.retunes
    }

    fn sample(&mut self, t: f64) -> (f64, f64) {
        let half_rate = self.rate as f64 / 2.0;
        let mut i = 0.0;
        let mut q = 0.0;
        for carrier in &self.carriers {
            let offset = carrier.frequency as f64 - self.center as f64;
            if offset.abs() >= half_rate {
                continue;
            }
            let phase = 2.0 * PI * offset * t;
            i += carrier.amplitude * phase.cos();
            q += carrier.amplitude * phase.sin();
        }
        if let Some(noise) = self.noise.as_mut() {
            i += noise();
            q += noise();
        }
        (i, q)
    }
}

fn quantize(value: f64) -> u8 {
    (SAMPLE_OFFSET as f64 + value).round().clamp(0.0, 255.0) as u8
}

impl TunerDevice for SyntheticDevice {
    fn set_center_frequency(&mut self, hz: u32) -> DeviceResult<()> {
        if hz == 0 {
            return Err(DeviceError::Setting {
                what: "center frequency",
                code: -22,
            });
        }
        if hz != self.center {
            self.retunes += 1;
        }
        self.center = hz;
        Ok(())
    }

    fn center_frequency(&self) -> u32 {
        self.center
    }

    fn set_sample_rate(&mut self, hz: u32) -> DeviceResult<()> {
        if hz == 0 {
            return Err(DeviceError::Setting {
                what: "sample rate",
                code: -22,
            });
        }
        self.rate = hz;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn set_gain_mode(&mut self, mode: GainMode) -> DeviceResult<()> {
        self.gain_mode = mode;
        Ok(())
    }

    fn set_gain(&mut self, tenths_db: i32) -> DeviceResult<()> {
        self.gain = Some(tenths_db);
        Ok(())
    }

    fn reset_buffer(&mut self) -> DeviceResult<()> {
        Ok(())
    }

    fn read_sync(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        if self.rate == 0 {
            return Err(DeviceError::Read("sample rate not set".into()));
        }
        let len = self.read_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        let rate = self.rate as f64;
        for pair in buf[..len].chunks_mut(2) {
            let t = self.sample_index as f64 / rate;
            let (i, q) = self.sample(t);
            pair[0] = quantize(i);
            if let Some(slot) = pair.get_mut(1) {
                *slot = quantize(q);
            }
            self.sample_index += 1;
        }
        Ok(len)
    }

    fn tuner_gains(&self) -> Vec<i32> {
        R820T_GAINS.to_vec()
    }

    fn set_frequency_correction(&mut self, ppm: i32) -> DeviceResult<()> {
        self.ppm = ppm;
        Ok(())
    }
}
