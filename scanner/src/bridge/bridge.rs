use crate::bridge::model::{SpectrumModel, StatusModel};
use log::{error, info};
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use sweepcore::prelude::ScanResult;
use sweepcore::report::{MetricSeries, ReportRow, ReportSink};
use sweepcore::telemetry::MetricsRecorder;
use tokio::runtime::Builder;
use warp::Filter;

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Default)]
struct BridgeState {
    latest: SpectrumModel,
    pending: SpectrumModel,
}

/// Report sink that publishes each completed interval over HTTP.
///
/// Rows collect in a pending snapshot and replace the published one on flush,
/// so readers never see a half-written report.
#[derive(Clone)]
pub struct ReportBridge {
    state: Arc<RwLock<BridgeState>>,
    metrics: Arc<MetricsRecorder>,
}

impl ReportBridge {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::default())),
            metrics,
        }
    }

    pub fn latest(&self) -> SpectrumModel {
        self.state
            .read()
            .map(|state| state.latest.clone())
            .unwrap_or_default()
    }

    pub fn status(&self) -> StatusModel {
        let latest = self.latest();
        StatusModel {
            hops: latest.series.len(),
            last_report: (!latest.timestamp.is_empty()).then_some(latest.timestamp),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Serves `GET /report` and `GET /status` from a background thread.
    pub fn spawn(&self, addr: SocketAddr) {
        let report_bridge = self.clone();
        let status_bridge = self.clone();
        let report_route = warp::path("report")
            .and(warp::get())
            .map(move || warp::reply::json(&report_bridge.latest()));
        let status_route = warp::path("status")
            .and(warp::get())
            .map(move || warp::reply::json(&status_bridge.status()));

        thread::spawn(move || {
            let routes = report_route.or(status_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build HTTP runtime: {}", err);
                    return;
                }
            };
            info!("Serving reports on http://{}/report", addr);
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
    }
}

impl ReportSink for ReportBridge {
    fn emit(&mut self, row: &ReportRow) -> ScanResult<()> {
        if let Ok(mut state) = self.state.write() {
            if state.pending.timestamp != row.timestamp {
                state.pending = SpectrumModel {
                    timestamp: row.timestamp.clone(),
                    series: Vec::new(),
                };
            }
            state.pending.series.push(MetricSeries::from(row));
        }
        Ok(())
    }

    fn flush(&mut self) -> ScanResult<()> {
        if let Ok(mut state) = self.state.write() {
            let complete = std::mem::take(&mut state.pending);
            state.latest = complete;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(timestamp: &str, low: i64) -> ReportRow {
        ReportRow {
            timestamp: timestamp.into(),
            low,
            high: low + 1000,
            step: 500.0,
            samples: 8,
            dbm: vec![-40.0, -41.5],
        }
    }

    #[test]
    fn bridge_publishes_only_complete_reports() {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut bridge = ReportBridge::new(metrics.clone());
        bridge.emit(&row("2024-05-01, 12:00:00", 0)).unwrap();
        assert!(bridge.latest().series.is_empty());
        bridge.emit(&row("2024-05-01, 12:00:00", 1000)).unwrap();
        bridge.flush().unwrap();

        let latest = bridge.latest();
        assert_eq!(latest.series.len(), 2);
        assert_eq!(latest.series[1].frequency_low, 1000);

        metrics.record_report();
        let status = bridge.status();
        assert_eq!(status.hops, 2);
        assert_eq!(status.last_report.as_deref(), Some("2024-05-01, 12:00:00"));
        assert_eq!(status.metrics.reports, 1);
    }

    #[test]
    fn new_interval_replaces_the_previous_one() {
        let mut bridge = ReportBridge::new(Arc::new(MetricsRecorder::new()));
        bridge.emit(&row("2024-05-01, 12:00:00", 0)).unwrap();
        bridge.flush().unwrap();
        bridge.emit(&row("2024-05-01, 12:00:10", 0)).unwrap();
        bridge.flush().unwrap();
        let latest = bridge.latest();
        assert_eq!(latest.timestamp, "2024-05-01, 12:00:10");
        assert_eq!(latest.series.len(), 1);
        let json = serde_json::to_string(&latest).unwrap();
        assert!(json.contains("\"frequencyLow\":0"));
    }
}
