//! # Gain Ramps
//!
//! Changing a gain instantly between two audio blocks produces a step in
//! the waveform, which is heard as a click. Instead we ramp the gain
//! linearly across the block:
//!
//! ```text
//! gain[i] = start + (end - start) * i / count
//! ```
//!
//! The first sample uses exactly `start`; the last sample stops one step
//! short of `end`, and the next block picks up at `end`. When `start ==
//! end` the ramp degenerates into a plain multiply, so unity gain leaves
//! samples bit-identical.

/// The gain applied to sample `index` of a `count`-sample ramp.
#[inline]
pub fn ramp_gain(start: f32, end: f32, index: usize, count: usize) -> f32 {
    if start == end || count == 0 {
        return start;
    }
    start + (end - start) * (index as f32 / count as f32)
}

/// Multiply `samples` in place by a gain ramp from `start` to `end`.
pub fn apply_gain_ramp(samples: &mut [f32], start: f32, end: f32) {
    let count = samples.len();
    if start == end {
        if start != 1.0 {
            samples.iter_mut().for_each(|s| *s *= start);
        }
        return;
    }

    for (i, sample) in samples.iter_mut().enumerate() {
        *sample *= ramp_gain(start, end, i, count);
    }
}

/// Add `source * ramp(start, end)` into `destination`.
///
/// Only `min(destination.len(), source.len())` samples are touched.
/// `ramp_offset` and `ramp_count` position this run inside a longer ramp,
/// so a copy split around the end of a ring buffer still sees one
/// continuous gain curve.
pub fn add_with_ramp(
    destination: &mut [f32],
    source: &[f32],
    start: f32,
    end: f32,
    ramp_offset: usize,
    ramp_count: usize,
) {
    for (i, (dst, src)) in destination.iter_mut().zip(source).enumerate() {
        *dst += *src * ramp_gain(start, end, ramp_offset + i, ramp_count);
    }
}
