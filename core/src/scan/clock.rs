use chrono::{Local, TimeZone, Utc};

/// Report timestamp layout: date and time as two comma separated fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

/// Time source for report deadlines and row timestamps.
pub trait Clock {
    /// Current unix time in seconds.
    fn now(&self) -> i64;

    fn timestamp(&self, at: i64) -> String {
        Utc.timestamp_opt(at, 0)
            .single()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// Wall clock; timestamps are rendered in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Local::now().timestamp()
    }

    fn timestamp(&self, at: i64) -> String {
        Local
            .timestamp_opt(at, 0)
            .earliest()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }
}
