//! Hop planning: splits a survey span into device-tunable steps.

pub mod plan;
pub mod step;

pub use plan::{build_plan, TuningPlan};
pub use step::TuningStep;

/// Highest sample rate the tuner sustains without dropping samples.
pub const MAX_RATE: u32 = 2_800_000;
/// Lowest sample rate the tuner supports.
pub const MIN_RATE: u32 = 1_000_000;
/// Smallest raw buffer read per hop, in bytes.
pub const DEFAULT_BUF_LENGTH: usize = 16_384;
/// Bytes discarded after a retune while the tuner settles.
pub const BUFFER_DUMP: usize = 1 << 12;
/// Hop counts tried when searching for a rate that fits.
pub const HOP_SEARCH_LIMIT: usize = 1500;
/// Largest FFT exponent the planner will choose.
pub const MAX_BIN_EXPONENT: u32 = 21;
