use serde::Serialize;
use std::sync::Mutex;

/// Running counters for a scan session, shared between the loop and any observers.
pub struct MetricsRecorder {
    inner: Mutex<ScanMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetrics {
    pub sweeps: u64,
    pub retunes: u64,
    pub dropped_reads: u64,
    pub bad_retunes: u64,
    pub reports: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ScanMetrics::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut ScanMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_sweep(&self) {
        self.update(|m| m.sweeps += 1);
    }

    pub fn record_retune(&self) {
        self.update(|m| m.retunes += 1);
    }

    pub fn record_bad_retune(&self) {
        self.update(|m| m.bad_retunes += 1);
    }

    pub fn record_dropped_read(&self) {
        self.update(|m| m.dropped_reads += 1);
    }

    pub fn record_report(&self) {
        self.update(|m| m.reports += 1);
    }

    pub fn snapshot(&self) -> ScanMetrics {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
