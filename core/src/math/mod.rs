pub mod fft;
pub mod stats;
pub mod window;

pub use fft::{fix_fft, SineTable};
pub use stats::StatsHelper;
pub use window::{WindowFunction, WindowTable};
