use crate::prelude::{ScanError, ScanResult};

fn zeroed<T: Clone + Default>(what: &'static str, len: usize) -> ScanResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| ScanError::Allocation { what, len })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// One hop of the plan together with the buffers it owns.
///
/// `raw` receives the unsigned tuner bytes and `scratch` is the working
/// integer buffer reused every sweep for decimation and the FFT. Neither is
/// shared with any other step.
#[derive(Debug, Clone)]
pub struct TuningStep {
    pub center_frequency: u32,
    pub sample_rate: u32,
    /// Bin count is `2^bin_exponent`; zero selects the scalar RMS path.
    pub bin_exponent: u32,
    pub downsample: usize,
    pub downsample_passes: u32,
    pub crop: f64,
    pub(crate) accumulator: Vec<i64>,
    pub(crate) raw: Vec<u8>,
    pub(crate) scratch: Vec<i16>,
    pub(crate) sample_count: u64,
}

impl TuningStep {
    pub fn new(
        center_frequency: u32,
        sample_rate: u32,
        bin_exponent: u32,
        downsample: usize,
        downsample_passes: u32,
        crop: f64,
        buffer_len: usize,
    ) -> ScanResult<Self> {
        let scratch_len = if bin_exponent == 0 { 0 } else { buffer_len };
        Ok(Self {
            center_frequency,
            sample_rate,
            bin_exponent,
            downsample,
            downsample_passes,
            crop,
            accumulator: zeroed("accumulator", 1usize << bin_exponent)?,
            raw: zeroed("raw buffer", buffer_len)?,
            scratch: zeroed("scratch buffer", scratch_len)?,
            sample_count: 0,
        })
    }

    pub fn bin_count(&self) -> usize {
        1 << self.bin_exponent
    }

    pub fn buffer_len(&self) -> usize {
        self.raw.len()
    }

    /// Width of one reported bin in hertz.
    pub fn bin_size_hz(&self) -> f64 {
        self.sample_rate as f64 / (self.bin_count() * self.downsample) as f64
    }

    pub fn accumulator(&self) -> &[i64] {
        &self.accumulator
    }

    /// Raw-sample-equivalent contributions since the last report.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.raw
    }

    /// Clears the interval accumulation after a report.
    pub fn reset(&mut self) {
        self.accumulator.iter_mut().for_each(|cell| *cell = 0);
        self.sample_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_step_is_zeroed_and_sized() {
        let step = TuningStep::new(100_000_000, 2_000_000, 5, 1, 0, 0.0, 16_384).unwrap();
        assert_eq!(step.bin_count(), 32);
        assert_eq!(step.accumulator().len(), 32);
        assert!(step.accumulator().iter().all(|&v| v == 0));
        assert_eq!(step.buffer_len(), 16_384);
        assert_eq!(step.bin_size_hz(), 62_500.0);
    }

    #[test]
    fn scalar_step_needs_no_scratch() {
        let step = TuningStep::new(100_000_000, 1_000_000, 0, 1, 0, 0.0, 16_384).unwrap();
        assert_eq!(step.accumulator().len(), 1);
        assert!(step.scratch.is_empty());
    }

    #[test]
    fn oversized_buffer_reports_allocation_failure() {
        let err = TuningStep::new(1, 1, 1, 1, 0, 0.0, usize::MAX).unwrap_err();
        assert!(matches!(err, ScanError::Allocation { .. }));
    }
}
