use crate::prelude::DecimationMode;

/// Largest pass count with a droop-compensation table.
pub const DROOP_TABLE_MAX: u32 = 10;

/// Nine-tap droop compensation filters indexed by recursive pass count.
///
/// Element 0 is the tap count, elements 1..=5 the symmetric half of the filter
/// (scaled by 2^15); the trailing four mirror them and are kept for reference.
const DROOP_TAPS: [[i32; 10]; DROOP_TABLE_MAX as usize] = [
    [9, -156, -97, 2798, -15489, 61019, -15489, 2798, -97, -156],
    [9, -128, -568, 5593, -24125, 74126, -24125, 5593, -568, -128],
    [9, -129, -639, 6187, -26281, 77511, -26281, 6187, -639, -129],
    [9, -122, -612, 6082, -26353, 77818, -26353, 6082, -612, -122],
    [9, -120, -602, 6015, -26269, 77757, -26269, 6015, -602, -120],
    [9, -120, -582, 5951, -26128, 77542, -26128, 5951, -582, -120],
    [9, -119, -580, 5931, -26094, 77505, -26094, 5931, -580, -119],
    [9, -119, -578, 5921, -26077, 77484, -26077, 5921, -578, -119],
    [9, -119, -577, 5917, -26067, 77473, -26067, 5917, -577, -119],
    [9, -199, -362, 5303, -25505, 77489, -25505, 5303, -362, -199],
];

/// Droop filter for `passes` recursive halvings, if one is tabulated.
pub fn droop_taps(passes: u32) -> Option<&'static [i32; 10]> {
    if passes == 0 {
        return None;
    }
    DROOP_TAPS.get(passes as usize - 1)
}

/// Sums each run of `downsample` I/Q pairs and packs the sums at the front.
///
/// Pairs past the packed region are left zeroed. The window later scales the
/// sums by 256 into `i16`, so any sum beyond ±127 wraps: keep the per-sample
/// amplitude times `downsample` within that after DC removal.
pub fn boxcar(buf: &mut [i16], downsample: usize) {
    if downsample <= 1 {
        return;
    }
    let group = downsample * 2;
    let mut target = 0;
    let mut j = 2;
    while j + 1 < buf.len() {
        buf[target] = buf[target].wrapping_add(buf[j]);
        buf[target + 1] = buf[target + 1].wrapping_add(buf[j + 1]);
        buf[j] = 0;
        buf[j + 1] = 0;
        j += 2;
        if j % group == 0 {
            target += 2;
        }
    }
}

/// Half-band low-pass and 2x decimation of one interleaved stream.
///
/// Works on `data[offset]`, `data[offset + 2]`, ... up to `length` elements and
/// writes the halved stream back at the same stride. The first outputs are
/// eased in from the leading samples instead of carrying state between calls.
pub fn fifth_order(data: &mut [i16], offset: usize, length: usize) {
    let length = length.min(data.len().saturating_sub(offset));
    if length < 12 {
        return;
    }
    let d = &mut data[offset..offset + length];
    let at = |d: &[i16], i: usize| d[i] as i32;
    let (mut a, mut b, mut c, mut dd, mut e, mut f) =
        (at(d, 0), at(d, 2), at(d, 4), at(d, 6), at(d, 8), at(d, 10));

    // a downsample should improve resolution, so the output is not fully shifted
    d[0] = (((a + b) * 10 + (c + dd) * 5 + dd + f) >> 4) as i16;
    d[2] = (((b + c) * 10 + (a + dd) * 5 + e + f) >> 4) as i16;
    d[4] = ((a + (b + e) * 5 + (c + dd) * 10 + f) >> 4) as i16;
    let mut i = 12;
    while i < length {
        a = c;
        b = dd;
        c = e;
        dd = f;
        e = at(d, i - 2);
        f = at(d, i);
        d[i / 2] = ((a + (b + e) * 5 + (c + dd) * 10 + f) >> 4) as i16;
        i += 4;
    }
}

/// One recursive pass over both the I and Q streams.
pub fn downsample_iq(data: &mut [i16], length: usize) {
    fifth_order(data, 0, length);
    fifth_order(data, 1, length.saturating_sub(1));
}

/// Nine-tap symmetric FIR over one interleaved stream.
///
/// The first nine samples prime the history and pass through unfiltered.
pub fn droop_fir(data: &mut [i16], offset: usize, length: usize, taps: &[i32; 10]) {
    let length = length.min(data.len().saturating_sub(offset));
    if length < 18 {
        return;
    }
    let d = &mut data[offset..offset + length];
    let mut hist = [0i64; 9];
    for (k, slot) in hist.iter_mut().enumerate() {
        *slot = d[k * 2] as i64;
    }
    let fir = |t: usize| taps[t] as i64;
    let mut i = 18;
    while i < length {
        let incoming = d[i] as i64;
        let sum = (hist[0] + hist[8]) * fir(1)
            + (hist[1] + hist[7]) * fir(2)
            + (hist[2] + hist[6]) * fir(3)
            + (hist[3] + hist[5]) * fir(4)
            + hist[4] * fir(5);
        d[i] = (sum >> 15) as i16;
        hist.copy_within(1.., 0);
        hist[8] = incoming;
        i += 2;
    }
}

/// Reduces a converted hop buffer by the step's downsample plan.
///
/// Returns the number of leading elements that now hold decimated I/Q pairs.
pub fn decimate(buf: &mut [i16], mode: DecimationMode, downsample: usize, passes: u32) -> usize {
    let len = buf.len();
    if mode.is_boxcar() {
        boxcar(buf, downsample);
    } else if passes > 0 {
        for pass in 0..passes {
            downsample_iq(buf, len >> pass);
        }
        if mode.droop_compensated() {
            if let Some(taps) = droop_taps(passes) {
                let remaining = len >> passes;
                droop_fir(buf, 0, remaining, taps);
                droop_fir(buf, 1, remaining.saturating_sub(1), taps);
            }
        }
    }
    len / downsample.max(1)
}
