use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sweepcore::device::{
    Carrier, DeviceCatalog, DeviceError, DeviceInfo, DeviceResult, SyntheticDevice, TunerDevice,
};
use sweepcore::units::parse_frequency;

/// A carrier on the simulated air, frequency written with the usual suffixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierProfile {
    pub frequency: String,
    pub amplitude: f64,
}

impl CarrierProfile {
    fn new(frequency: &str, amplitude: f64) -> Self {
        Self {
            frequency: frequency.to_string(),
            amplitude,
        }
    }
}

/// Configuration for the synthetic tuner used when no capture is replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub carriers: Vec<CarrierProfile>,
    /// Peak uniform noise per rail, in 8-bit sample counts.
    pub noise: f64,
    pub seed: u64,
    pub serial: String,
    /// Caps every read to this many bytes, to rehearse dropped samples.
    pub read_limit: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            carriers: vec![
                CarrierProfile::new("94.1M", 40.0),
                CarrierProfile::new("100.3M", 25.0),
                CarrierProfile::new("433.92M", 30.0),
            ],
            noise: 1.5,
            seed: 0,
            serial: "00000001".into(),
            read_limit: None,
        }
    }
}

impl GeneratorConfig {
    fn carriers(&self) -> anyhow::Result<Vec<Carrier>> {
        self.carriers
            .iter()
            .map(|profile| -> anyhow::Result<Carrier> {
                let hz = parse_frequency(&profile.frequency)
                    .with_context(|| format!("parsing carrier {}", profile.frequency))?;
                Ok(Carrier {
                    frequency: hz.round() as u32,
                    amplitude: profile.amplitude,
                })
            })
            .collect()
    }

    pub fn build_device(&self) -> anyhow::Result<SyntheticDevice> {
        let mut device = SyntheticDevice::new(self.carriers()?);
        if self.noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let noise = self.noise;
            device = device.with_noise(move || rng.gen_range(-noise..noise));
        }
        if let Some(limit) = self.read_limit {
            device = device.with_read_limit(limit);
        }
        Ok(device)
    }
}

/// Catalog exposing a single synthetic tuner.
pub struct SimulatedCatalog {
    config: GeneratorConfig,
}

impl SimulatedCatalog {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }
}

impl DeviceCatalog for SimulatedCatalog {
    fn devices(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            index: 0,
            vendor: "Generic".into(),
            product: "Synthetic tuner".into(),
            serial: self.config.serial.clone(),
        }]
    }

    fn open(&self, index: usize) -> DeviceResult<Box<dyn TunerDevice>> {
        if index != 0 {
            return Err(DeviceError::Open(index));
        }
        let device = self.config.build_device().map_err(|err| {
            log::error!("synthetic tuner setup failed: {:#}", err);
            DeviceError::Open(index)
        })?;
        Ok(Box::new(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_builds_a_device() {
        let config = GeneratorConfig::default();
        let mut device = config.build_device().unwrap();
        device.set_sample_rate(2_400_000).unwrap();
        device.set_center_frequency(94_000_000).unwrap();
        let mut buf = vec![0u8; 512];
        assert_eq!(device.read_sync(&mut buf).unwrap(), 512);
        assert!(buf.iter().any(|&b| b != 127));
    }

    #[test]
    fn seeded_noise_is_repeatable() {
        let config = GeneratorConfig {
            carriers: Vec::new(),
            noise: 5.0,
            seed: 42,
            ..Default::default()
        };
        let read = |config: &GeneratorConfig| {
            let mut device = config.build_device().unwrap();
            device.set_sample_rate(1_000_000).unwrap();
            let mut buf = vec![0u8; 64];
            device.read_sync(&mut buf).unwrap();
            buf
        };
        assert_eq!(read(&config), read(&config));
    }

    #[test]
    fn bad_carrier_frequency_is_reported() {
        let config = GeneratorConfig {
            carriers: vec![CarrierProfile::new("12Q", 1.0)],
            ..Default::default()
        };
        assert!(config.build_device().is_err());
        assert!(SimulatedCatalog::new(config).open(0).is_err());
    }

    #[test]
    fn catalog_lists_the_configured_serial() {
        let catalog = SimulatedCatalog::new(GeneratorConfig::default());
        assert_eq!(catalog.devices()[0].serial, "00000001");
        assert!(catalog.open(1).is_err());
        assert!(catalog.open(0).is_ok());
    }
}
