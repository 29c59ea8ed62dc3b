use crate::prelude::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

/// Integer scale applied to window coefficients before the sample multiply.
pub const WINDOW_SCALE: f64 = 256.0;

/// Window applied to each FFT block before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    #[default]
    Rectangle,
    Hamming,
    Blackman,
    BlackmanHarris,
    HannPoisson,
    /// Blackman-Harris tapered by a shallow Poisson envelope.
    BlackmanHarrisPoisson,
    Bartlett,
}

fn blackman_harris(n: f64, n1: f64) -> f64 {
    let (a0, a1, a2, a3) = (0.35875, 0.48829, 0.14128, 0.01168);
    a0 - a1 * (2.0 * n * PI / n1).cos() + a2 * (4.0 * n * PI / n1).cos()
        - a3 * (6.0 * n * PI / n1).cos()
}

fn poisson(alpha: f64, n: f64, n1: f64) -> f64 {
    let distance = (n1 - 1.0 - 2.0 * n).trunc().abs();
    E.powf(-alpha * distance / n1)
}

impl WindowFunction {
    pub const ALL: [WindowFunction; 7] = [
        WindowFunction::Rectangle,
        WindowFunction::Hamming,
        WindowFunction::Blackman,
        WindowFunction::BlackmanHarris,
        WindowFunction::HannPoisson,
        WindowFunction::BlackmanHarrisPoisson,
        WindowFunction::Bartlett,
    ];

    /// Coefficient in `[0, 1]` for sample `index` of a `length`-point block.
    pub fn coefficient(&self, index: usize, length: usize) -> f64 {
        if length < 2 {
            return 1.0;
        }
        let n = index as f64;
        let n1 = (length - 1) as f64;
        match self {
            WindowFunction::Rectangle => 1.0,
            WindowFunction::Hamming => {
                let (a, b) = (25.0 / 46.0, 21.0 / 46.0);
                a - b * (2.0 * n * PI / n1).cos()
            }
            WindowFunction::Blackman => {
                let a0 = 7938.0 / 18608.0;
                let a1 = 9240.0 / 18608.0;
                let a2 = 1430.0 / 18608.0;
                a0 - a1 * (2.0 * n * PI / n1).cos() + a2 * (4.0 * n * PI / n1).cos()
            }
            WindowFunction::BlackmanHarris => blackman_harris(n, n1),
            WindowFunction::HannPoisson => {
                0.5 * (1.0 - (2.0 * PI * n / n1).cos()) * poisson(2.0, n, n1)
            }
            WindowFunction::BlackmanHarrisPoisson => {
                blackman_harris(n, n1) * poisson(0.0025, n, n1)
            }
            WindowFunction::Bartlett => {
                let half = length as f64 / 2.0;
                1.0 - ((n - n1 / 2.0) / half).abs()
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowFunction::Rectangle => "rectangle",
            WindowFunction::Hamming => "hamming",
            WindowFunction::Blackman => "blackman",
            WindowFunction::BlackmanHarris => "blackman-harris",
            WindowFunction::HannPoisson => "hann-poisson",
            WindowFunction::BlackmanHarrisPoisson => "blackman-harris-poisson",
            WindowFunction::Bartlett => "bartlett",
        }
    }
}

impl FromStr for WindowFunction {
    type Err = ScanError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectangle" => Ok(WindowFunction::Rectangle),
            "hamming" => Ok(WindowFunction::Hamming),
            "blackman" => Ok(WindowFunction::Blackman),
            "blackman-harris" => Ok(WindowFunction::BlackmanHarris),
            "hann-poisson" => Ok(WindowFunction::HannPoisson),
            "blackman-harris-poisson" | "youssef" => Ok(WindowFunction::BlackmanHarrisPoisson),
            "bartlett" => Ok(WindowFunction::Bartlett),
            "kaiser" => Err(ScanError::UnsupportedWindow(
                "kaiser is not implemented".into(),
            )),
            other => Err(ScanError::UnsupportedWindow(other.to_string())),
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Window coefficients for one block length, pre-scaled for integer multiply.
#[derive(Debug, Clone)]
pub struct WindowTable {
    function: WindowFunction,
    coefficients: Vec<i32>,
}

impl WindowTable {
    pub fn new(function: WindowFunction, length: usize) -> ScanResult<Self> {
        let mut coefficients = Vec::new();
        coefficients
            .try_reserve_exact(length)
            .map_err(|_| ScanError::Allocation {
                what: "window table",
                len: length,
            })?;
        coefficients.extend(
            (0..length).map(|i| (WINDOW_SCALE * function.coefficient(i, length)) as i32),
        );
        Ok(Self {
            function,
            coefficients,
        })
    }

    pub fn function(&self) -> WindowFunction {
        self.function
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[i32] {
        &self.coefficients
    }

    /// Multiplies each I and Q sample of one interleaved block by its coefficient.
    pub fn apply(&self, block: &mut [i16]) {
        for (pair, &coef) in block.chunks_exact_mut(2).zip(&self.coefficients) {
            pair[0] = (pair[0] as i32 * coef) as i16;
            pair[1] = (pair[1] as i32 * coef) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_stay_in_unit_interval() {
        for function in WindowFunction::ALL {
            for i in 0..64 {
                let w = function.coefficient(i, 64);
                assert!((-1e-9..=1.0 + 1e-9).contains(&w), "{} at {} = {}", function, i, w);
            }
        }
    }

    #[test]
    fn tapered_windows_peak_in_the_middle() {
        for function in [
            WindowFunction::Hamming,
            WindowFunction::Blackman,
            WindowFunction::BlackmanHarris,
            WindowFunction::HannPoisson,
            WindowFunction::Bartlett,
        ] {
            let edge = function.coefficient(0, 65);
            let centre = function.coefficient(32, 65);
            assert!(centre > edge, "{}", function);
            assert!(centre > 0.9, "{}", function);
        }
    }

    #[test]
    fn rectangle_table_is_full_scale() {
        let table = WindowTable::new(WindowFunction::Rectangle, 16).unwrap();
        assert_eq!(table.len(), 16);
        assert!(table.coefficients().iter().all(|&c| c == 256));
    }

    #[test]
    fn apply_scales_both_rails() {
        let table = WindowTable::new(WindowFunction::Rectangle, 2).unwrap();
        let mut block = vec![1, -2, 3, -4];
        table.apply(&mut block);
        assert_eq!(block, vec![256, -512, 768, -1024]);
    }

    #[test]
    fn names_round_trip_and_kaiser_is_refused() {
        for function in WindowFunction::ALL {
            assert_eq!(function.name().parse::<WindowFunction>().unwrap(), function);
        }
        assert!(matches!(
            "kaiser".parse::<WindowFunction>(),
            Err(ScanError::UnsupportedWindow(_))
        ));
        assert!("triangle".parse::<WindowFunction>().is_err());
    }
}
