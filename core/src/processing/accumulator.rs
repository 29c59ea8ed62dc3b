use crate::math::stats::StatsHelper;
use crate::prelude::AccumulationMode;

impl AccumulationMode {
    /// Folds one power measurement into an accumulator cell.
    #[inline]
    pub fn fold(self, cell: &mut i64, power: i64) {
        match self {
            AccumulationMode::Average => *cell += power,
            AccumulationMode::PeakHold => *cell = (*cell).max(power),
        }
    }
}

/// Adds the squared magnitude of every bin in an interleaved FFT block.
pub fn accumulate_spectrum(accumulator: &mut [i64], block: &[i16], mode: AccumulationMode) {
    for (cell, pair) in accumulator.iter_mut().zip(block.chunks_exact(2)) {
        mode.fold(cell, StatsHelper::real_conj(pair[0], pair[1]));
    }
}
