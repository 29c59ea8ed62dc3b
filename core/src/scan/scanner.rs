use super::clock::Clock;
use super::state::{ExitReason, ScanState, StopHandle};
use crate::device::{configure_device, TunerDevice};
use crate::prelude::{ScanConfig, ScanResult};
use crate::processing::acquisition::{Acquisition, SweepOutcome};
use crate::report::{ReportSink, Reporter};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::tuning::TuningPlan;
use std::sync::Arc;

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub sweeps: u64,
    pub reports: u64,
    pub exit_reason: ExitReason,
}

/// Drives full-plan sweeps and interval reports until an exit condition fires.
pub struct Scanner {
    config: ScanConfig,
    state: ScanState,
    reporter: Reporter,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl Scanner {
    /// Validates the configuration and builds the plan and tables. No device I/O.
    pub fn new(config: ScanConfig, metrics: Arc<MetricsRecorder>) -> ScanResult<Self> {
        let logger = LogManager::new("scanner");
        let plan = TuningPlan::from_config(&config)?;
        plan.log_summary(&logger);
        let acquisition = Acquisition::new(&plan, &config, metrics.clone())?;
        Ok(Self {
            config,
            state: ScanState::new(plan, acquisition, StopHandle::new()),
            reporter: Reporter::new(),
            metrics,
            logger,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn plan(&self) -> &TuningPlan {
        &self.state.plan
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Handle for raising the stop level from another thread or a signal handler.
    pub fn stop_handle(&self) -> StopHandle {
        self.state.stop.clone()
    }

    /// Applies device settings plus the plan's rate and first frequency.
    pub fn prepare(&self, device: &mut dyn TunerDevice) -> ScanResult<()> {
        let first = self
            .state
            .plan
            .steps()
            .first()
            .map_or(self.config.range.lower, |s| s.center_frequency);
        configure_device(device, &self.config.device, self.state.plan.sample_rate(), first)?;
        Ok(())
    }

    pub fn run(
        &mut self,
        device: &mut dyn TunerDevice,
        sink: &mut dyn ReportSink,
        clock: &dyn Clock,
    ) -> ScanResult<ScanSummary> {
        let interval = self.config.interval() as i64;
        let start = clock.now();
        let mut next_report = start + interval;
        self.state.next_report = Some(next_report);
        self.state.exit_at = self.config.exit_after_secs.map(|secs| start + secs as i64);
        self.state.exit = None;

        let mut sweeps = 0u64;
        let mut reports = 0u64;
        let exit_reason = loop {
            let outcome = self.state.acquisition.sweep(
                device,
                &mut self.state.plan,
                &self.state.stop,
            )?;
            if outcome == SweepOutcome::Aborted || self.state.stop.abort_requested() {
                break ExitReason::Aborted;
            }
            sweeps += 1;

            let now = clock.now();
            let finishing = self.state.stop.finish_requested();
            let timer_up = self.state.exit_at.is_some_and(|at| now >= at);
            if now < next_report && !finishing && !timer_up {
                continue;
            }

            let stamp = clock.timestamp(now);
            self.reporter.report_plan(&mut self.state.plan, &stamp, sink)?;
            reports += 1;
            self.metrics.record_report();

            let after = clock.now();
            while after >= next_report {
                next_report += interval;
            }
            self.state.next_report = Some(next_report);

            if finishing {
                break ExitReason::Signal;
            }
            if self.config.single_shot {
                break ExitReason::SingleShot;
            }
            if timer_up || self.state.exit_at.is_some_and(|at| after >= at) {
                break ExitReason::Timer;
            }
        };

        self.state.exit = Some(exit_reason);
        match exit_reason {
            ExitReason::Signal | ExitReason::Aborted => {
                self.logger.record("User cancel, exiting...")
            }
            ExitReason::SingleShot => self.logger.record("Single shot complete, exiting..."),
            ExitReason::Timer => self.logger.record("Exit time reached, exiting..."),
        }
        Ok(ScanSummary {
            sweeps,
            reports,
            exit_reason,
        })
    }
}
