use crate::processing::acquisition::Acquisition;
use crate::tuning::TuningPlan;
use log::warn;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Shared stop request counter.
///
/// Level 1 lets the current pass finish and report once; level 2 or more
/// abandons the pass at the next hop boundary without reporting.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    level: Arc<AtomicU8>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the stop level by one and returns the new level.
    pub fn request_stop(&self) -> u8 {
        let previous = self
            .level
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |l| {
                Some(l.saturating_add(1))
            })
            .unwrap_or(u8::MAX);
        let level = previous.saturating_add(1);
        if level == 1 {
            warn!("Stop requested, finishing scan pass...");
        } else {
            warn!("Stop requested again, aborting immediately...");
        }
        level
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::SeqCst)
    }

    pub fn finish_requested(&self) -> bool {
        self.level() >= 1
    }

    pub fn abort_requested(&self) -> bool {
        self.level() >= 2
    }
}

/// Why the scan loop reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Stop level 1: the final pass was drained and reported.
    Signal,
    /// Stop level 2 or more: the pass was abandoned without a report.
    Aborted,
    SingleShot,
    Timer,
}

/// Run state threaded through the scan loop.
pub struct ScanState {
    pub plan: TuningPlan,
    pub acquisition: Acquisition,
    pub stop: StopHandle,
    /// Unix time of the next report; unset until the loop starts.
    pub next_report: Option<i64>,
    /// Absolute unix time after which the loop stops.
    pub exit_at: Option<i64>,
    pub exit: Option<ExitReason>,
}

impl ScanState {
    pub fn new(plan: TuningPlan, acquisition: Acquisition, stop: StopHandle) -> Self {
        Self {
            plan,
            acquisition,
            stop,
            next_report: None,
            exit_at: None,
            exit: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.exit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_levels_escalate_across_clones() {
        let stop = StopHandle::new();
        let remote = stop.clone();
        assert!(!stop.finish_requested());
        assert_eq!(remote.request_stop(), 1);
        assert!(stop.finish_requested());
        assert!(!stop.abort_requested());
        assert_eq!(remote.request_stop(), 2);
        assert!(stop.abort_requested());
    }

    #[test]
    fn stop_level_saturates() {
        let stop = StopHandle::new();
        for _ in 0..300 {
            stop.request_stop();
        }
        assert_eq!(stop.level(), u8::MAX);
    }
}
