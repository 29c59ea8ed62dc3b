use log::{debug, info, warn};

/// Thin wrapper over the `log` facade that tags records with the scan component.
#[derive(Debug, Clone)]
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn record(&self, message: &str) {
        info!(target: "sweep", "[{}] {}", self.component, message);
    }

    pub fn detail(&self, message: &str) {
        debug!(target: "sweep", "[{}] {}", self.component, message);
    }

    /// Non-fatal conditions such as short reads or a missed retune.
    pub fn warn(&self, message: &str) {
        warn!(target: "sweep", "[{}] {}", self.component, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("scan")
    }
}
