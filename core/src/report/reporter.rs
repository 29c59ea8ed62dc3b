use super::{ReportRow, ReportSink};
use crate::prelude::ScanResult;
use crate::telemetry::LogManager;
use crate::tuning::{TuningPlan, TuningStep};

/// Turns interval accumulations into report rows and clears them.
pub struct Reporter {
    logger: LogManager,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("report"),
        }
    }

    /// Builds the row for one step, then resets its accumulation.
    ///
    /// Power is normalized by `rate * sample_count` in both accumulation
    /// modes, so peak-hold values read as peak power per accumulated sample.
    pub fn finalize(step: &mut TuningStep, timestamp: &str) -> ReportRow {
        let len = step.bin_count();
        let ds = step.downsample;
        if step.bin_exponent > 0 {
            // DC is unusable after the transform, and the spectrum comes out rotated by half
            step.accumulator[0] = step.accumulator[1];
            let (left, right) = step.accumulator.split_at_mut(len / 2);
            left.swap_with_slice(right);
        }

        let rate = step.sample_rate as f64;
        let retained = (len as f64 * (1.0 - step.crop)) as i64;
        let bw2 = ((rate * retained as f64) / (len * 2 * ds) as f64) as i64;
        let center = step.center_frequency as i64;

        let trim = (len as f64 * step.crop * 0.5) as usize;
        let last = (len - 1).saturating_sub(trim);
        let norm = rate * step.sample_count as f64;
        let dbm = if trim > last {
            Vec::new()
        } else {
            step.accumulator[trim..=last]
                .iter()
                .map(|&power| 10.0 * (power as f64 / norm).log10())
                .collect()
        };

        let row = ReportRow {
            timestamp: timestamp.to_string(),
            low: center - bw2,
            high: center + bw2,
            step: rate / (len * ds) as f64,
            samples: step.sample_count,
            dbm,
        };
        step.reset();
        row
    }

    /// Emits one row per step in plan order and flushes the sink.
    pub fn report_plan(
        &self,
        plan: &mut TuningPlan,
        timestamp: &str,
        sink: &mut dyn ReportSink,
    ) -> ScanResult<usize> {
        let mut rows = 0;
        for step in plan.steps_mut() {
            let row = Self::finalize(step, timestamp);
            sink.emit(&row)?;
            rows += 1;
        }
        sink.flush()?;
        self.logger
            .detail(&format!("reported {} rows at {}", rows, timestamp));
        Ok(rows)
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
