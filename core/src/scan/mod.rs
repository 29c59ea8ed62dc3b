//! The scan loop and the run state it carries.

pub mod clock;
pub mod scanner;
pub mod state;

pub use clock::{Clock, SystemClock, TIMESTAMP_FORMAT};
pub use scanner::{ScanSummary, Scanner};
pub use state::{ExitReason, ScanState, StopHandle};
