use serde::{Deserialize, Serialize};
use sweepcore::report::MetricSeries;
use sweepcore::telemetry::ScanMetrics;

/// Most recent complete report, one series per hop.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumModel {
    pub timestamp: String,
    pub series: Vec<MetricSeries>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusModel {
    pub hops: usize,
    pub last_report: Option<String>,
    pub metrics: ScanMetrics,
}
