use super::{
    TuningStep, DEFAULT_BUF_LENGTH, HOP_SEARCH_LIMIT, MAX_BIN_EXPONENT, MAX_RATE, MIN_RATE,
};
use crate::prelude::{DecimationMode, ScanConfig, ScanError, ScanResult};
use crate::telemetry::log::LogManager;
use crate::units::FrequencyRange;

/// Ordered hops covering the requested span. Immutable apart from per-step buffers.
#[derive(Debug, Clone)]
pub struct TuningPlan {
    steps: Vec<TuningStep>,
    hop_bandwidth: u32,
    lower: u32,
}

/// Shared hop parameters chosen before the steps are materialized.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    hops: usize,
    bw_seen: i64,
    bw_used: i64,
    bin_exponent: u32,
    downsample: i64,
    downsample_passes: u32,
    crop: f64,
}

fn widen(bw_seen: i64, crop: f64) -> i64 {
    (bw_seen as f64 / (1.0 - crop)) as i64
}

fn giant_bins(span: i64, max_bin: i64) -> ScanResult<Layout> {
    if max_bin > MAX_RATE as i64 {
        return Err(ScanError::InvalidConfig(format!(
            "bin size {} Hz exceeds the {} Hz device rate",
            max_bin, MAX_RATE
        )));
    }
    Ok(Layout {
        hops: (span / max_bin) as usize,
        bw_seen: max_bin,
        bw_used: max_bin,
        bin_exponent: 0,
        downsample: 1,
        downsample_passes: 0,
        crop: 0.0,
    })
}

fn fft_bins(span: i64, max_bin: i64, crop: f64, decimation: DecimationMode) -> ScanResult<Layout> {
    let (hops, bw_seen, mut bw_used) = (1..HOP_SEARCH_LIMIT as i64)
        .map(|i| (i, span / i, widen(span / i, crop)))
        .find(|&(_, _, used)| used <= MAX_RATE as i64)
        .ok_or(ScanError::BandwidthTooWide)?;
    let mut hops = hops as usize;

    // narrow spans oversample one hop and decimate down
    let mut downsample = 1i64;
    let mut downsample_passes = 0u32;
    if bw_used < MIN_RATE as i64 {
        hops = 1;
        downsample = MAX_RATE as i64 / bw_used.max(1);
        bw_used *= downsample;
    }
    if !decimation.is_boxcar() && downsample > 1 {
        downsample_passes = (downsample as f64).log2().floor() as u32;
        downsample = 1 << downsample_passes;
        bw_used = widen(bw_seen * downsample, crop);
    }

    let bin_exponent = (1..=MAX_BIN_EXPONENT)
        .find(|&e| bw_used as f64 / ((1i64 << e) * downsample) as f64 <= max_bin as f64)
        .unwrap_or(MAX_BIN_EXPONENT);

    Ok(Layout {
        hops,
        bw_seen,
        bw_used,
        bin_exponent,
        downsample,
        downsample_passes,
        crop,
    })
}

/// Raw buffer length: whole FFT blocks, never below the minimum read size.
fn buffer_length(bin_exponent: u32, downsample: i64) -> ScanResult<usize> {
    let block = 2usize
        .checked_shl(bin_exponent)
        .and_then(|b| b.checked_mul(downsample as usize))
        .ok_or(ScanError::Allocation {
            what: "raw buffer",
            len: usize::MAX,
        })?;
    if block >= DEFAULT_BUF_LENGTH {
        return Ok(block);
    }
    Ok(DEFAULT_BUF_LENGTH.div_ceil(block) * block)
}

/// Plans the hops for `range`, rejecting anything over `max_hops` steps.
pub fn build_plan(
    range: &FrequencyRange,
    crop: f64,
    decimation: DecimationMode,
    max_hops: usize,
) -> ScanResult<TuningPlan> {
    range.validate()?;
    if !(0.0..=1.0).contains(&crop) {
        return Err(ScanError::InvalidConfig(format!(
            "crop value {} outside of 0 to 1",
            crop
        )));
    }
    let span = range.span() as i64;
    let max_bin = range.max_bin_size as i64;

    let layout = if max_bin >= MIN_RATE as i64 {
        giant_bins(span, max_bin)?
    } else {
        fft_bins(span, max_bin, crop, decimation)?
    };
    if layout.hops == 0 {
        return Err(ScanError::EmptyPlan);
    }
    if layout.hops > max_hops {
        return Err(ScanError::TooManyHops {
            hops: layout.hops,
            limit: max_hops,
        });
    }

    let buffer_len = buffer_length(layout.bin_exponent, layout.downsample)?;
    let mut steps = Vec::new();
    steps
        .try_reserve_exact(layout.hops)
        .map_err(|_| ScanError::Allocation {
            what: "tuning plan",
            len: layout.hops,
        })?;
    for i in 0..layout.hops as i64 {
        let center = range.lower as i64 + i * layout.bw_seen + layout.bw_seen / 2;
        steps.push(TuningStep::new(
            center as u32,
            layout.bw_used as u32,
            layout.bin_exponent,
            layout.downsample as usize,
            layout.downsample_passes,
            layout.crop,
            buffer_len,
        )?);
    }

    Ok(TuningPlan {
        steps,
        hop_bandwidth: layout.bw_seen as u32,
        lower: range.lower,
    })
}

impl TuningPlan {
    pub fn from_config(config: &ScanConfig) -> ScanResult<Self> {
        config.validate()?;
        build_plan(
            &config.range,
            config.crop,
            config.decimation,
            config.max_hops,
        )
    }

    pub fn steps(&self) -> &[TuningStep] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [TuningStep] {
        &mut self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Usable bandwidth of each hop before cropping is undone.
    pub fn hop_bandwidth(&self) -> u32 {
        self.hop_bandwidth
    }

    pub fn lower(&self) -> u32 {
        self.lower
    }

    fn first(&self) -> Option<&TuningStep> {
        self.steps.first()
    }

    pub fn sample_rate(&self) -> u32 {
        self.first().map_or(0, |s| s.sample_rate)
    }

    pub fn bin_exponent(&self) -> u32 {
        self.first().map_or(0, |s| s.bin_exponent)
    }

    pub fn downsample(&self) -> usize {
        self.first().map_or(1, |s| s.downsample)
    }

    pub fn crop(&self) -> f64 {
        self.first().map_or(0.0, |s| s.crop)
    }

    pub fn buffer_len(&self) -> usize {
        self.first().map_or(0, |s| s.buffer_len())
    }

    pub fn bin_size_hz(&self) -> f64 {
        self.first().map_or(0.0, |s| s.bin_size_hz())
    }

    pub fn total_bins(&self) -> usize {
        self.steps.iter().map(TuningStep::bin_count).sum()
    }

    pub fn logged_bins(&self) -> usize {
        (self.total_bins() as f64 * (1.0 - self.crop())) as usize
    }

    pub fn log_summary(&self, logger: &LogManager) {
        let rate = self.sample_rate();
        logger.record(&format!("Number of frequency hops: {}", self.len()));
        logger.record(&format!("Dongle bandwidth: {}Hz", rate));
        logger.record(&format!("Downsampling by: {}x", self.downsample()));
        logger.record(&format!("Cropping by: {:.2}%", self.crop() * 100.0));
        logger.record(&format!("Total FFT bins: {}", self.total_bins()));
        logger.record(&format!("Logged FFT bins: {}", self.logged_bins()));
        logger.record(&format!("FFT bin size: {:.2}Hz", self.bin_size_hz()));
        logger.record(&format!(
            "Buffer size: {} bytes ({:.2}ms)",
            self.buffer_len(),
            1000.0 * 0.5 * self.buffer_len() as f64 / rate.max(1) as f64
        ));
    }
}
