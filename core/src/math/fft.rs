//! In-place radix-2 FFT over interleaved 16-bit I/Q.
//!
//! Integers throughout: -32768..32767 maps to -1.0..1.0. Every butterfly stage
//! halves its operands so the output is the transform scaled by `1/N`, which
//! keeps intermediate values inside 16 bits for 8-bit sourced input.

use crate::prelude::{ScanError, ScanResult};

/// Smallest table the quarter-wave cosine lookup can index.
const MIN_TABLE_LOG2: u32 = 2;

/// Precomputed sine samples, three quarters of a cycle, at `2^log2_len` resolution.
#[derive(Debug, Clone)]
pub struct SineTable {
    log2_len: u32,
    len: usize,
    sine: Vec<i16>,
}

impl SineTable {
    /// Builds a table able to transform blocks of up to `2^bin_exponent` points.
    pub fn for_exponent(bin_exponent: u32) -> ScanResult<Self> {
        let log2_len = bin_exponent.max(MIN_TABLE_LOG2);
        let len = 1usize << log2_len;
        let entries = len * 3 / 4;
        let mut sine = Vec::new();
        sine.try_reserve_exact(entries)
            .map_err(|_| ScanError::Allocation {
                what: "sine table",
                len: entries,
            })?;
        sine.extend((0..entries).map(|i| {
            let phase = i as f64 * 2.0 * std::f64::consts::PI / len as f64;
            (32767.0 * phase.sin()).round() as i16
        }));
        Ok(Self {
            log2_len,
            len,
            sine,
        })
    }

    /// Largest transform length this table supports.
    pub fn capacity(&self) -> usize {
        self.len
    }

    pub fn log2_capacity(&self) -> u32 {
        self.log2_len
    }

    /// Twiddle factor `(cos, -sin)` for table index `j`.
    fn twiddle(&self, j: usize) -> (i16, i16) {
        (self.sine[j + self.len / 4], -self.sine[j])
    }
}

/// Fixed-point multiply of two Q15 values with round-half-up.
#[inline]
pub fn fix_mpy(a: i16, b: i16) -> i16 {
    let c = (a as i32 * b as i32) >> 14;
    let round = c & 0x01;
    ((c >> 1) + round) as i16
}

/// Decimation-in-time reordering of `2^log2_len` interleaved I/Q pairs.
pub fn bit_reverse(iq: &mut [i16], log2_len: u32) {
    let n = 1usize << log2_len;
    let nn = n - 1;
    let mut mr = 0usize;
    for m in 1..=nn {
        let mut l = n;
        loop {
            l >>= 1;
            if mr + l <= nn {
                break;
            }
        }
        mr = (mr & (l - 1)) + l;
        if mr <= m {
            continue;
        }
        iq.swap(2 * m, 2 * mr);
        iq.swap(2 * m + 1, 2 * mr + 1);
    }
}

/// Forward transform of `2^log2_len` interleaved I/Q pairs at the start of `iq`.
pub fn fix_fft(iq: &mut [i16], log2_len: u32, table: &SineTable) -> ScanResult<()> {
    let n = 1usize << log2_len;
    if n > table.capacity() {
        return Err(ScanError::FftTooLarge {
            length: n,
            capacity: table.capacity(),
        });
    }
    if iq.len() < 2 * n {
        return Err(ScanError::InvalidConfig(format!(
            "transform of {} points needs {} values, buffer holds {}",
            n,
            2 * n,
            iq.len()
        )));
    }

    bit_reverse(iq, log2_len);

    let mut l = 1usize;
    let mut k = table.log2_capacity() - 1;
    while l < n {
        let istep = l << 1;
        for m in 0..l {
            let (wr, wi) = table.twiddle(m << k);
            // halve every stage for headroom
            let (wr, wi) = (wr >> 1, wi >> 1);
            let mut i = m;
            while i < n {
                let j = i + l;
                let tr = fix_mpy(wr, iq[2 * j]).wrapping_sub(fix_mpy(wi, iq[2 * j + 1]));
                let ti = fix_mpy(wr, iq[2 * j + 1]).wrapping_add(fix_mpy(wi, iq[2 * j]));
                let qr = iq[2 * i] >> 1;
                let qi = iq[2 * i + 1] >> 1;
                iq[2 * j] = qr.wrapping_sub(tr);
                iq[2 * j + 1] = qi.wrapping_sub(ti);
                iq[2 * i] = qr.wrapping_add(tr);
                iq[2 * i + 1] = qi.wrapping_add(ti);
                i += istep;
            }
        }
        k = k.saturating_sub(1);
        l = istep;
    }
    Ok(())
}
