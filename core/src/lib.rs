//! Fixed-point spectral survey core for 8-bit I/Q tuners.
//!
//! A requested span is split into hops ([`tuning`]), each hop is acquired,
//! decimated and transformed ([`processing`], [`math`]), and per-bin power is
//! accumulated and reported once per interval ([`report`]) by the loop in
//! [`scan`]. Hardware sits behind the [`device::TunerDevice`] trait.

pub mod device;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod report;
pub mod scan;
pub mod telemetry;
pub mod tuning;
pub mod units;

pub use prelude::{AccumulationMode, DecimationMode, ScanConfig, ScanError, ScanResult};
pub use scan::{Scanner, StopHandle};
pub use tuning::{TuningPlan, TuningStep};
pub use units::FrequencyRange;
