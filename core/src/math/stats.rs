/// Fixed DC offset of unsigned 8-bit tuner samples.
pub const SAMPLE_OFFSET: i32 = 127;

pub struct StatsHelper;

impl StatsHelper {
    /// Power of one complex sample, `re² + im²`.
    #[inline]
    pub fn real_conj(re: i16, im: i16) -> i64 {
        re as i64 * re as i64 + im as i64 * im as i64
    }

    /// Sum of squares of raw 8-bit samples with the residual DC bias removed analytically.
    pub fn rms_power(raw: &[u8]) -> i64 {
        if raw.is_empty() {
            return 0;
        }
        let mut total = 0i64;
        let mut power = 0i64;
        for &byte in raw {
            let s = byte as i64 - SAMPLE_OFFSET as i64;
            total += s;
            power += s * s;
        }
        let dc = total as f64 / raw.len() as f64;
        let err = total as f64 * 2.0 * dc - dc * dc * raw.len() as f64;
        power - err.round() as i64
    }

    /// Subtracts the mean of every other element of `data[offset..offset + length]`.
    pub fn remove_dc(data: &mut [i16], offset: usize, length: usize) {
        let end = (offset + length).min(data.len());
        if offset >= end {
            return;
        }
        let stream = || (offset..end).step_by(2);
        let count = stream().count() as i64;
        let sum: i64 = stream().map(|i| data[i] as i64).sum();
        let mean = (sum / count) as i16;
        if mean == 0 {
            return;
        }
        for i in stream() {
            data[i] = data[i].wrapping_sub(mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_conj_is_squared_magnitude() {
        assert_eq!(StatsHelper::real_conj(3, -4), 25);
        assert_eq!(StatsHelper::real_conj(i16::MIN, i16::MIN), 2 * 32768 * 32768);
    }

    #[test]
    fn rms_power_of_constant_input_is_zero() {
        assert_eq!(StatsHelper::rms_power(&[200; 64]), 0);
        assert_eq!(StatsHelper::rms_power(&[]), 0);
    }

    #[test]
    fn rms_power_ignores_dc_bias() {
        let centred: Vec<u8> = (0..64).map(|i| if i % 2 == 0 { 137 } else { 117 }).collect();
        let biased: Vec<u8> = centred.iter().map(|&b| b + 20).collect();
        assert_eq!(StatsHelper::rms_power(&centred), 64 * 100);
        assert_eq!(StatsHelper::rms_power(&biased), 64 * 100);
    }

    #[test]
    fn remove_dc_touches_only_its_stream() {
        let mut data = vec![10, 1, 12, 1, 14, 1];
        StatsHelper::remove_dc(&mut data, 0, 6);
        assert_eq!(data, vec![-2, 1, 0, 1, 2, 1]);
        StatsHelper::remove_dc(&mut data, 1, 5);
        assert_eq!(data, vec![-2, 0, 0, 0, 2, 0]);
    }

    #[test]
    fn remove_dc_skips_zero_mean() {
        let mut data = vec![1, 7, -1, 7];
        StatsHelper::remove_dc(&mut data, 0, 4);
        assert_eq!(data, vec![1, 7, -1, 7]);
    }
}
