use anyhow::Context;
use log::info;
use std::sync::Arc;
use sweepcore::device::{select_device, DeviceCatalog};
use sweepcore::prelude::ScanConfig;
use sweepcore::report::ReportSink;
use sweepcore::scan::{Clock, ScanSummary, Scanner, StopHandle};
use sweepcore::telemetry::MetricsRecorder;

/// Plans a survey, opens the selected tuner and runs the scan loop to completion.
#[derive(Clone)]
pub struct Runner {
    config: ScanConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// `on_start` receives the stop handle before any device is touched.
    pub fn execute(
        &self,
        catalog: &dyn DeviceCatalog,
        sink: &mut dyn ReportSink,
        clock: &dyn Clock,
        on_start: impl FnOnce(StopHandle),
    ) -> anyhow::Result<ScanSummary> {
        let mut scanner = Scanner::new(self.config.clone(), self.metrics.clone())
            .context("planning scan")?;
        on_start(scanner.stop_handle());

        let devices = catalog.devices();
        info!("Found {} device(s):", devices.len());
        let index = select_device(&devices, &self.config.device.selector)
            .context("selecting device")?;
        let mut device = catalog
            .open(index)
            .with_context(|| format!("opening device #{}", index))?;
        scanner
            .prepare(device.as_mut())
            .context("configuring device")?;

        let summary = scanner
            .run(device.as_mut(), sink, clock)
            .context("running scan")?;
        let metrics = self.metrics.snapshot();
        info!(
            "Scan finished ({:?}): {} sweeps, {} reports, {} retunes, {} dropped reads",
            summary.exit_reason,
            metrics.sweeps,
            metrics.reports,
            metrics.retunes,
            metrics.dropped_reads
        );
        Ok(summary)
    }
}
