//! # Ring Buffer
//!
//! The ring buffer is the "tape loop" of the echo: it remembers the most
//! recent `capacity` samples of every channel. Writing past the end wraps
//! around to index 0 and overwrites the oldest audio.
//!
//! Unlike a per-sample delay line, this buffer works on whole blocks. A
//! block of `n` samples written at the cursor may run off the end of the
//! storage, in which case the copy is split into two contiguous runs:
//!
//! ```text
//!  capacity = 8, cursor = 6, n = 4
//!
//!  index:   0   1   2   3   4   5   6   7
//!          [h0][h1][  ][  ][  ][  ][t0][t1]
//!           └─ head run ─┘          └ tail run ┘
//! ```
//!
//! The tail run (`capacity - start` samples at most) is copied first, the
//! remainder goes to the head of the buffer.
//!
//! All channels share a single write cursor. Every channel's writes and
//! reads for a block are made relative to the cursor as it was at the
//! start of that block; the cursor is advanced once, after all channels
//! are done.

use std::num::NonZeroUsize;
use std::ops::Range;

use nih_plug::nih_debug_assert;

use super::gain::add_with_ramp;

/// Fixed-capacity, per-channel circular sample store with a shared cursor.
///
/// Storage is allocated only in [`configure()`](Self::configure). Every
/// other method is allocation-free and safe to call on the audio thread.
pub struct RingBuffer {
    /// One flat sample array per channel, each exactly `capacity` long.
    channels: Vec<Vec<f32>>,

    /// Number of samples each channel can hold. Never zero, so the
    /// modular arithmetic below can't divide by zero.
    capacity: usize,

    /// Index of the next slot to be overwritten. Always `< capacity`.
    write_cursor: usize,
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffer {
    /// An unconfigured ring with no channels. Reads and writes are no-ops
    /// until [`configure()`](Self::configure) is called.
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            capacity: 1,
            write_cursor: 0,
        }
    }

    /// (Re)allocate storage for `channel_count` channels of `capacity`
    /// samples, zero-fill it, and reset the cursor to 0.
    ///
    /// Called on the control path whenever the sample rate changes. Existing
    /// allocations are reused where they are large enough.
    pub fn configure(&mut self, channel_count: usize, capacity: NonZeroUsize) {
        let capacity = capacity.get();

        self.channels.resize_with(channel_count, Vec::new);
        for samples in &mut self.channels {
            samples.clear();
            samples.resize(capacity, 0.0);
        }

        self.capacity = capacity;
        self.write_cursor = 0;
    }

    /// Silence every channel and move the cursor back to 0. Capacity is kept.
    pub fn clear(&mut self) {
        for samples in &mut self.channels {
            samples.fill(0.0);
        }
        self.write_cursor = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Overwrite `samples.len()` slots starting at `cursor + offset`.
    pub fn write_replace(&mut self, channel: usize, offset_from_cursor: usize, samples: &[f32]) {
        let start = (self.write_cursor + offset_from_cursor) % self.capacity;
        let count = self.checked_count(samples.len());
        let (tail, head) = split_runs(self.capacity, start, count);
        let Some(buffer) = self.channel_mut(channel) else {
            return;
        };

        let split = tail.len();
        buffer[tail].copy_from_slice(&samples[..split]);
        buffer[head].copy_from_slice(&samples[split..count]);
    }

    /// Add `samples[i] * lerp(gain_start, gain_end, i / count)` onto the
    /// slots starting at `cursor + offset`.
    ///
    /// This is an add, not an overwrite: feedback is layered on top of the
    /// signal already written there during the same block.
    pub fn write_accumulate_ramped(
        &mut self,
        channel: usize,
        offset_from_cursor: usize,
        samples: &[f32],
        gain_start: f32,
        gain_end: f32,
    ) {
        let start = (self.write_cursor + offset_from_cursor) % self.capacity;
        let count = self.checked_count(samples.len());
        let (tail, head) = split_runs(self.capacity, start, count);
        let Some(buffer) = self.channel_mut(channel) else {
            return;
        };

        let split = tail.len();
        add_with_ramp(&mut buffer[tail], &samples[..split], gain_start, gain_end, 0, count);
        add_with_ramp(
            &mut buffer[head],
            &samples[split..count],
            gain_start,
            gain_end,
            split,
            count,
        );
    }

    /// Add `destination.len()` ring samples, starting at the absolute index
    /// `read_position`, into `destination` with a linear gain ramp.
    pub fn read_accumulate_ramped(
        &self,
        channel: usize,
        read_position: usize,
        destination: &mut [f32],
        gain_start: f32,
        gain_end: f32,
    ) {
        let start = read_position % self.capacity;
        let count = self.checked_count(destination.len());
        let (tail, head) = split_runs(self.capacity, start, count);
        let Some(buffer) = self.channel(channel) else {
            return;
        };

        let split = tail.len();
        let (dest_tail, dest_head) = destination[..count].split_at_mut(split);
        add_with_ramp(dest_tail, &buffer[tail], gain_start, gain_end, 0, count);
        add_with_ramp(dest_head, &buffer[head], gain_start, gain_end, split, count);
    }

    /// Move the shared cursor forward by `count` samples.
    ///
    /// Call exactly once per block, after every channel has been written
    /// and read.
    pub fn advance_cursor(&mut self, count: usize) {
        self.write_cursor = (self.write_cursor + count % self.capacity) % self.capacity;
    }

    /// Map any (possibly negative) index onto `0..capacity`.
    ///
    /// `rem_euclid` is used instead of `%` because Rust's `%` keeps the sign
    /// of the left operand: `-3 % 8 == -3`, while `(-3).rem_euclid(8) == 5`.
    #[inline]
    pub fn wrap_index(&self, index: isize) -> usize {
        index.rem_euclid(self.capacity as isize) as usize
    }

    /// The sample stored at an absolute index, or silence for an
    /// unconfigured channel.
    #[inline]
    pub fn sample(&self, channel: usize, index: usize) -> f32 {
        self.channels
            .get(channel)
            .map_or(0.0, |buffer| buffer[index % self.capacity])
    }

    /// Add `value` onto the sample stored at an absolute index.
    #[inline]
    pub fn add_sample(&mut self, channel: usize, index: usize, value: f32) {
        let capacity = self.capacity;
        if let Some(buffer) = self.channels.get_mut(channel) {
            buffer[index % capacity] += value;
        }
    }

    /// Read `delay_samples` behind the absolute index `anchor`, blending
    /// the two neighbouring slots for fractional delays.
    ///
    /// For a delay of 441.3 samples:
    /// - slot `anchor - 441` gets weight 0.7
    /// - slot `anchor - 442` gets weight 0.3
    pub fn read_interpolated(&self, channel: usize, anchor: usize, delay_samples: f32) -> f32 {
        let whole = delay_samples.floor();
        let frac = delay_samples - whole;

        let index_a = self.wrap_index(anchor as isize - whole as isize);
        let index_b = self.wrap_index(index_a as isize - 1);

        let sample_a = self.sample(channel, index_a);
        if frac == 0.0 {
            return sample_a;
        }
        sample_a * (1.0 - frac) + self.sample(channel, index_b) * frac
    }

    /// Runs longer than the ring would overlap themselves. Callers must keep
    /// blocks shorter than `capacity`; if one slips through it is truncated
    /// instead of indexing out of bounds.
    fn checked_count(&self, count: usize) -> usize {
        nih_debug_assert!(
            count <= self.capacity,
            "block of {} samples exceeds ring capacity {}",
            count,
            self.capacity
        );
        count.min(self.capacity)
    }

    fn channel(&self, channel: usize) -> Option<&[f32]> {
        nih_debug_assert!(channel < self.channels.len(), "channel {} not configured", channel);
        self.channels.get(channel).map(Vec::as_slice)
    }

    fn channel_mut(&mut self, channel: usize) -> Option<&mut [f32]> {
        nih_debug_assert!(channel < self.channels.len(), "channel {} not configured", channel);
        self.channels.get_mut(channel).map(Vec::as_mut_slice)
    }
}

/// Split `count` samples starting at `start` into the run up to the end of
/// the buffer and the run that wraps around to index 0.
fn split_runs(capacity: usize, start: usize, count: usize) -> (Range<usize>, Range<usize>) {
    let samples_to_end = capacity - start;
    let first = count.min(samples_to_end);
    (start..start + first, 0..count - first)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring(channels: usize, capacity: usize) -> RingBuffer {
        let mut ring = RingBuffer::new();
        ring.configure(channels, NonZeroUsize::new(capacity).unwrap());
        ring
    }

    fn read_back(ring: &RingBuffer, channel: usize, position: usize, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];
        ring.read_accumulate_ramped(channel, position, &mut out, 1.0, 1.0);
        out
    }

    /// capacity = 4: write [1,2,3,4] (cursor wraps to 0), then [5,6].
    #[test]
    fn test_capacity_four_walkthrough() {
        let mut ring = ring(1, 4);

        ring.write_replace(0, 0, &[1.0, 2.0, 3.0, 4.0]);
        ring.advance_cursor(4);
        assert_eq!(ring.write_cursor(), 0);

        ring.write_replace(0, 0, &[5.0, 6.0]);
        ring.advance_cursor(2);
        assert_eq!(ring.write_cursor(), 2);
        assert_eq!(read_back(&ring, 0, 0, 4), vec![5.0, 6.0, 3.0, 4.0]);

        assert_eq!(read_back(&ring, 0, 2, 2), vec![3.0, 4.0]);
    }

    #[test]
    fn test_zero_delay_read_reproduces_write() {
        let mut ring = ring(2, 16);
        ring.advance_cursor(13);

        let block = [0.1, -0.2, 0.3, -0.4, 0.5, -0.6];
        ring.write_replace(1, 0, &block);

        let cursor = ring.write_cursor();
        assert_eq!(read_back(&ring, 1, cursor, block.len()), block.to_vec());
        // The other channel is untouched.
        assert_eq!(read_back(&ring, 0, cursor, block.len()), vec![0.0; 6]);
    }

    /// After writing `capacity + k` samples, the ring holds exactly the
    /// last `capacity` of them, oldest first from the cursor.
    #[test]
    fn test_wrap_keeps_most_recent_capacity_samples() {
        let mut ring = ring(1, 8);
        let mut next = 1.0;

        for block_len in [3, 3, 3, 2] {
            let block: Vec<f32> = (0..block_len)
                .map(|_| {
                    let v = next;
                    next += 1.0;
                    v
                })
                .collect();
            ring.write_replace(0, 0, &block);
            ring.advance_cursor(block_len);
        }

        let expected: Vec<f32> = (4..=11).map(|v| v as f32).collect();
        assert_eq!(read_back(&ring, 0, ring.write_cursor(), 8), expected);
    }

    #[test]
    fn test_accumulate_adds_across_wrap() {
        let mut ring = ring(1, 4);
        ring.advance_cursor(3);

        ring.write_replace(0, 0, &[1.0, 1.0]);
        ring.write_accumulate_ramped(0, 0, &[2.0, 4.0], 0.5, 0.5);

        // Slot 3 and slot 0 hold 1 + 0.5 * x.
        assert_eq!(read_back(&ring, 0, 0, 4), vec![3.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_accumulate_ramp_is_continuous_across_wrap() {
        let mut ring = ring(1, 4);
        ring.advance_cursor(2);

        ring.write_accumulate_ramped(0, 0, &[1.0; 4], 0.0, 1.0);

        // Ramp 0, 0.25, 0.5, 0.75 starting at slot 2.
        assert_eq!(read_back(&ring, 0, 2, 4), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_write_with_offset() {
        let mut ring = ring(1, 5);
        ring.advance_cursor(4);

        ring.write_replace(0, 2, &[7.0, 8.0]);

        // (4 + 2) % 5 = 1
        assert_eq!(read_back(&ring, 0, 0, 5), vec![0.0, 7.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_accumulates_into_destination() {
        let mut ring = ring(1, 4);
        ring.write_replace(0, 0, &[1.0, 2.0, 3.0, 4.0]);

        let mut out = vec![10.0, 10.0, 10.0];
        ring.read_accumulate_ramped(0, 3, &mut out, 2.0, 2.0);

        // Reads slots 3, 0, 1.
        assert_eq!(out, vec![18.0, 12.0, 14.0]);
    }

    #[test]
    fn test_interpolated_read() {
        let mut ring = ring(1, 8);
        ring.write_replace(0, 0, &[0.0, 1.0]);
        ring.advance_cursor(2);

        // Anchor 2, delay 1.5: slot 1 (1.0) and slot 0 (0.0) at 0.5 each.
        let result = ring.read_interpolated(0, ring.write_cursor(), 1.5);
        assert!((result - 0.5).abs() < 1e-6, "Expected 0.5, got {result}");

        assert_eq!(ring.read_interpolated(0, 2, 1.0), 1.0);
    }

    #[test]
    fn test_interpolated_read_wraps_backwards() {
        let mut ring = ring(1, 4);
        ring.write_replace(0, 0, &[1.0, 2.0, 3.0, 4.0]);

        // Anchor 0, delay 1 → slot 3.
        assert_eq!(ring.read_interpolated(0, 0, 1.0), 4.0);
        // Anchor 0, delay 1.25 → 0.75 * slot 3 + 0.25 * slot 2.
        let result = ring.read_interpolated(0, 0, 1.25);
        assert!((result - 3.75).abs() < 1e-6, "Expected 3.75, got {result}");
    }

    #[test]
    fn test_clear_silences_and_resets_cursor() {
        let mut ring = ring(2, 6);
        ring.write_replace(0, 0, &[1.0; 4]);
        ring.write_replace(1, 0, &[1.0; 4]);
        ring.advance_cursor(4);

        ring.clear();

        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(ring.capacity(), 6);
        assert_eq!(read_back(&ring, 0, 0, 6), vec![0.0; 6]);
        assert_eq!(read_back(&ring, 1, 0, 6), vec![0.0; 6]);
    }

    #[test]
    fn test_reconfigure_resizes_and_zeroes() {
        let mut ring = ring(1, 4);
        ring.write_replace(0, 0, &[1.0; 4]);
        ring.advance_cursor(3);

        ring.configure(2, NonZeroUsize::new(10).unwrap());

        assert_eq!(ring.channel_count(), 2);
        assert_eq!(ring.capacity(), 10);
        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(read_back(&ring, 0, 0, 10), vec![0.0; 10]);
    }

    #[test]
    fn test_unconfigured_ring_is_inert() {
        let mut ring = RingBuffer::new();
        ring.write_replace(0, 0, &[1.0]);
        ring.advance_cursor(5);

        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(ring.sample(0, 0), 0.0);
    }

    #[test]
    fn test_oversized_block_is_truncated() {
        let mut ring = ring(1, 3);
        ring.write_replace(0, 0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(read_back(&ring, 0, 0, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_wrap_index_handles_negatives() {
        let ring = ring(1, 8);
        assert_eq!(ring.wrap_index(-3), 5);
        assert_eq!(ring.wrap_index(-8), 0);
        assert_eq!(ring.wrap_index(17), 1);
    }

    proptest! {
        /// Whatever block sizes are used, the cursor ends at N mod capacity.
        #[test]
        fn cursor_tracks_total_samples(
            capacity in 1usize..512,
            blocks in prop::collection::vec(0usize..512, 0..64),
        ) {
            let mut ring = ring(1, capacity);
            let mut total = 0usize;
            for block in &blocks {
                let block = (*block).min(capacity);
                ring.advance_cursor(block);
                total += block;
            }
            prop_assert_eq!(ring.write_cursor(), total % capacity);
        }
    }
}
