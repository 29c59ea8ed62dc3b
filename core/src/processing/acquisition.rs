use crate::device::TunerDevice;
use crate::math::fft::{fix_fft, SineTable};
use crate::math::stats::{StatsHelper, SAMPLE_OFFSET};
use crate::math::window::WindowTable;
use crate::prelude::{AccumulationMode, DecimationMode, ScanConfig, ScanError, ScanResult};
use crate::processing::accumulator::accumulate_spectrum;
use crate::processing::decimation::decimate;
use crate::scan::state::StopHandle;
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::tuning::{TuningPlan, TuningStep, BUFFER_DUMP};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How a sweep over the plan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    /// An abort request stopped the sweep between hops.
    Aborted,
}

/// Per-hop acquisition pipeline: retune, read, decimate, window, transform, accumulate.
///
/// Holds the tables built once for the run. Step buffers are borrowed one hop
/// at a time, so nothing is shared between steps.
pub struct Acquisition {
    sine: SineTable,
    window: WindowTable,
    decimation: DecimationMode,
    accumulation: AccumulationMode,
    settle: Duration,
    flush: Vec<u8>,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl Acquisition {
    pub fn new(
        plan: &TuningPlan,
        config: &ScanConfig,
        metrics: Arc<MetricsRecorder>,
    ) -> ScanResult<Self> {
        let bin_exponent = plan.bin_exponent();
        let sine = SineTable::for_exponent(bin_exponent)?;
        if plan.steps().iter().any(|s| s.bin_count() > sine.capacity()) {
            return Err(ScanError::FftTooLarge {
                length: plan.steps().iter().map(TuningStep::bin_count).max().unwrap_or(0),
                capacity: sine.capacity(),
            });
        }
        let window = WindowTable::new(config.window, 1usize << bin_exponent)?;
        Ok(Self {
            sine,
            window,
            decimation: config.decimation,
            accumulation: config.accumulation,
            settle: Duration::from_millis(config.settle_ms),
            flush: vec![0; BUFFER_DUMP],
            logger: LogManager::new("acquisition"),
            metrics,
        })
    }

    pub fn window(&self) -> &WindowTable {
        &self.window
    }

    pub fn accumulation(&self) -> AccumulationMode {
        self.accumulation
    }

    /// Runs every step of the plan once, checking for an abort between hops.
    pub fn sweep(
        &mut self,
        device: &mut dyn TunerDevice,
        plan: &mut TuningPlan,
        stop: &StopHandle,
    ) -> ScanResult<SweepOutcome> {
        for step in plan.steps_mut() {
            if stop.abort_requested() {
                return Ok(SweepOutcome::Aborted);
            }
            self.acquire(device, step)?;
        }
        self.metrics.record_sweep();
        Ok(SweepOutcome::Completed)
    }

    fn retune(&mut self, device: &mut dyn TunerDevice, frequency: u32) -> ScanResult<()> {
        device.set_center_frequency(frequency)?;
        self.metrics.record_retune();
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        let flushed = device.read_sync(&mut self.flush).unwrap_or(0);
        if flushed != self.flush.len() {
            self.logger.warn("bad retune");
            self.metrics.record_bad_retune();
        }
        Ok(())
    }

    fn acquire(&mut self, device: &mut dyn TunerDevice, step: &mut TuningStep) -> ScanResult<()> {
        if device.center_frequency() != step.center_frequency {
            self.retune(device, step.center_frequency)?;
        }
        let read = match device.read_sync(&mut step.raw) {
            Ok(n) => n,
            Err(err) => {
                self.logger.warn(&format!("read failed: {}", err));
                0
            }
        };
        if read != step.raw.len() {
            self.logger.warn("dropped samples");
            self.metrics.record_dropped_read();
        }

        if step.bin_exponent == 0 {
            let power = StatsHelper::rms_power(&step.raw);
            self.accumulation.fold(&mut step.accumulator[0], power);
            step.sample_count += 1;
            return Ok(());
        }
        self.transform_step(step)
    }

    /// Converts the raw buffer and folds every FFT block into the step's accumulator.
    pub fn transform_step(&self, step: &mut TuningStep) -> ScanResult<()> {
        let bins = step.bin_count();
        if bins > self.sine.capacity() {
            return Err(ScanError::FftTooLarge {
                length: bins,
                capacity: self.sine.capacity(),
            });
        }
        for (sample, &byte) in step.scratch.iter_mut().zip(&step.raw) {
            *sample = (byte as i32 - SAMPLE_OFFSET) as i16;
        }

        let used = decimate(
            &mut step.scratch,
            self.decimation,
            step.downsample,
            step.downsample_passes,
        );
        StatsHelper::remove_dc(&mut step.scratch, 0, used);
        StatsHelper::remove_dc(&mut step.scratch, 1, used.saturating_sub(1));

        let block_len = 2 * bins;
        for block in step.scratch[..used].chunks_exact_mut(block_len) {
            self.window.apply(block);
            fix_fft(block, step.bin_exponent, &self.sine)?;
            accumulate_spectrum(&mut step.accumulator, block, self.accumulation);
            step.sample_count += step.downsample as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Carrier, SyntheticDevice};
    use crate::units::FrequencyRange;

    fn setup(range_text: &str) -> (ScanConfig, TuningPlan, Acquisition, Arc<MetricsRecorder>) {
        let range: FrequencyRange = range_text.parse().unwrap();
        let mut config = ScanConfig::new(range);
        config.settle_ms = 0;
        let plan = TuningPlan::from_config(&config).unwrap();
        let metrics = Arc::new(MetricsRecorder::new());
        let acquisition = Acquisition::new(&plan, &config, metrics.clone()).unwrap();
        (config, plan, acquisition, metrics)
    }

    fn ready_device(plan: &TuningPlan, carriers: Vec<Carrier>) -> SyntheticDevice {
        let mut device = SyntheticDevice::new(carriers);
        device.set_sample_rate(plan.sample_rate()).unwrap();
        device
    }

    #[test]
    fn sweep_visits_every_hop_and_counts_blocks() {
        let (_, mut plan, mut acquisition, metrics) = setup("88M:108M:125k");
        let mut device = ready_device(&plan, Vec::new());
        let outcome = acquisition
            .sweep(&mut device, &mut plan, &StopHandle::new())
            .unwrap();
        assert_eq!(outcome, SweepOutcome::Completed);
        assert_eq!(device.retunes(), plan.len());
        let blocks = (plan.buffer_len() / (2 * 32)) as u64;
        for step in plan.steps() {
            assert_eq!(step.sample_count(), blocks);
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sweeps, 1);
        assert_eq!(snapshot.retunes, plan.len() as u64);
        assert_eq!(snapshot.dropped_reads, 0);
    }

    #[test]
    fn carrier_energy_lands_in_its_hop() {
        let (_, mut plan, mut acquisition, _) = setup("88M:108M:125k");
        let carrier = Carrier {
            frequency: 94_000_000,
            amplitude: 60.0,
        };
        let mut device = ready_device(&plan, vec![carrier]);
        acquisition
            .sweep(&mut device, &mut plan, &StopHandle::new())
            .unwrap();
        let energy: Vec<i64> = plan
            .steps()
            .iter()
            .map(|s| s.accumulator().iter().sum())
            .collect();
        let loudest = energy
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| **e)
            .map(|(i, _)| i)
            .unwrap();
        let step = &plan.steps()[loudest];
        let half = plan.hop_bandwidth() as i64 / 2;
        assert!((step.center_frequency as i64 - 94_000_000).abs() <= half);
    }

    #[test]
    fn abort_stops_before_the_next_hop() {
        let (_, mut plan, mut acquisition, metrics) = setup("88M:108M:125k");
        let mut device = ready_device(&plan, Vec::new());
        let stop = StopHandle::new();
        stop.request_stop();
        stop.request_stop();
        let outcome = acquisition.sweep(&mut device, &mut plan, &stop).unwrap();
        assert_eq!(outcome, SweepOutcome::Aborted);
        assert_eq!(device.retunes(), 0);
        assert_eq!(metrics.snapshot().sweeps, 0);
    }

    #[test]
    fn short_reads_are_counted_not_fatal() {
        let (_, mut plan, mut acquisition, metrics) = setup("88M:108M:125k");
        let mut device = ready_device(&plan, Vec::new()).with_read_limit(1000);
        acquisition
            .sweep(&mut device, &mut plan, &StopHandle::new())
            .unwrap();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dropped_reads, plan.len() as u64);
        // the capped device also truncates every post-retune flush
        assert_eq!(snapshot.bad_retunes, plan.len() as u64);
        assert!(plan.steps().iter().all(|s| s.sample_count() > 0));
    }

    #[test]
    fn giant_bins_take_the_scalar_path() {
        let (_, mut plan, mut acquisition, _) = setup("100M:110M:2M");
        let carrier = Carrier {
            frequency: 101_300_000,
            amplitude: 40.0,
        };
        let mut device = ready_device(&plan, vec![carrier]);
        acquisition
            .sweep(&mut device, &mut plan, &StopHandle::new())
            .unwrap();
        for step in plan.steps() {
            assert_eq!(step.sample_count(), 1);
            assert_eq!(step.accumulator().len(), 1);
        }
        assert!(plan.steps()[0].accumulator()[0] > plan.steps()[3].accumulator()[0]);
    }

    #[test]
    fn recursive_decimation_counts_raw_equivalent_samples() {
        let range: FrequencyRange = "100M:100.1M:1k".parse().unwrap();
        let mut config = ScanConfig::new(range);
        config.settle_ms = 0;
        config.decimation = DecimationMode::Recursive { fir_size: 9 };
        let mut plan = TuningPlan::from_config(&config).unwrap();
        let acquisition =
            Acquisition::new(&plan, &config, Arc::new(MetricsRecorder::new())).unwrap();
        let step = &mut plan.steps_mut()[0];
        step.raw_mut().fill(127);
        acquisition.transform_step(step).unwrap();
        let blocks = step.buffer_len() / step.downsample / (2 * step.bin_count());
        assert_eq!(step.sample_count(), (blocks * step.downsample) as u64);
        assert!(step.accumulator().iter().all(|&p| p == 0));
    }
}
