//! # Echo Engine
//!
//! The engine runs one channel of one audio block through the delay line.
//! For a block of `n` samples starting at the shared write cursor `c`:
//!
//! ```text
//!  1. FILL       ring[c .. c+n]  = input
//!  2. READ       delayed[i]      = ring[c + i - D]        (D = delay in samples)
//!  3. FEEDBACK   ring[c .. c+n] += delayed * feedback
//!  4. MIX        output[i]       = input[i] * (1 - wet) + delayed[i] * wet
//! ```
//!
//! Steps 1 and 3 together store `y[t] = x[t] + g * y[t - D]` in the ring,
//! so every pass around the loop comes back quieter by a factor of `g`:
//! the echo trail. The ring always holds the raw input; the dry level only
//! shapes what the listener hears.
//!
//! ## Two read paths
//!
//! When the delay is steady and at least one block long, the whole
//! delayed block already sits in the ring and is fetched with two
//! wrap-aware block copies (one per interpolation neighbour).
//!
//! When the delay time is gliding, or the delay is shorter than the block,
//! the engine falls back to a per-sample loop. Each sample gets its own
//! smoothed delay time, and its feedback is written back before the next
//! sample is read, so echoes shorter than a block still recirculate.
//!
//! The cursor is **not** advanced here. Every channel of a block reads and
//! writes relative to the same cursor; the block processor moves it once
//! all channels are done.

use std::num::NonZeroUsize;

use nih_plug::nih_debug_assert;

use super::gain::{add_with_ramp, apply_gain_ramp};
use super::parameters::{EffectParameters, MAX_DELAY_MS, MAX_FEEDBACK};
use super::ring_buffer::RingBuffer;
use super::smoother::SmoothedParameter;
use crate::error::ConfigError;

/// Used when the host hands us a sample rate we can't work with.
pub const FALLBACK_SAMPLE_RATE: f32 = 44100.0;

/// Ring size used if even the fallback sample rate can't be sized with the
/// current [`EngineConfig`].
const FALLBACK_CAPACITY: usize = 4096;

/// Tuning knobs fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Longest delay the engine has to serve.
    pub max_delay_ms: f32,

    /// Extra ring space beyond the longest delay. The largest block the
    /// engine handles in one piece is roughly this long; longer host
    /// blocks are split.
    pub headroom_seconds: f32,

    pub delay_ramp_seconds: f32,
    pub feedback_ramp_seconds: f32,
    pub mix_ramp_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delay_ms: MAX_DELAY_MS,
            // 2000 ms + 100 ms = the 2.1 s ring that covers smoothing
            // transitions at the top of the range.
            headroom_seconds: 0.1,
            delay_ramp_seconds: 0.05,
            feedback_ramp_seconds: 0.05,
            mix_ramp_seconds: 0.02,
        }
    }
}

/// Ring capacity and the longest block handled in one piece, or `None` if
/// the ring would be too large to index.
///
/// capacity = sample_rate * (max delay + headroom), e.g.
///   48000 Hz * 2.1 s = 100800 samples
///
/// Leaving `headroom` samples beyond the longest delay means a block of up
/// to `headroom` samples never overwrites history that is still to be read.
fn ring_sizes(sample_rate: f32, config: &EngineConfig) -> Option<(usize, usize)> {
    let max_delay = (sample_rate * config.max_delay_ms / 1000.0).ceil().max(0.0);
    let headroom = (sample_rate * config.headroom_seconds).ceil().max(1.0);
    let capacity = f64::from(max_delay) + f64::from(headroom) + 1.0;

    // Indices are handled as `isize` when wrapping backwards, and the
    // allocation itself can't exceed `isize::MAX` bytes.
    let limit = (isize::MAX as usize / std::mem::size_of::<f32>()) as f64;
    if !capacity.is_finite() || capacity > limit {
        return None;
    }

    Some((capacity as usize, headroom as usize))
}

/// `dry * (1 - wet) + delayed * wet`, with `wet` ramping from `wet_start`
/// to `wet_end` across the slice.
#[inline]
fn mix_into(dry: &mut [f32], delayed: &[f32], wet_start: f32, wet_end: f32) {
    apply_gain_ramp(dry, 1.0 - wet_start, 1.0 - wet_end);
    if wet_start != 0.0 || wet_end != 0.0 {
        add_with_ramp(dry, delayed, wet_start, wet_end, 0, delayed.len());
    }
}

/// Per-channel smoothing state. Persists across blocks.
#[derive(Default)]
struct ChannelState {
    delay_ms: SmoothedParameter,
    feedback: SmoothedParameter,
    wet: SmoothedParameter,

    /// False until the first block after configure/reset, which snaps to
    /// the incoming values instead of gliding up from zero.
    primed: bool,
}

impl ChannelState {
    fn configure(&mut self, sample_rate: f32, config: &EngineConfig) {
        self.delay_ms.configure(sample_rate, config.delay_ramp_seconds);
        self.feedback.configure(sample_rate, config.feedback_ramp_seconds);
        self.wet.configure(sample_rate, config.mix_ramp_seconds);
        self.primed = false;
    }

    fn update_targets(&mut self, params: &EffectParameters) {
        if self.primed {
            self.delay_ms.set_target(params.delay_ms);
            self.feedback.set_target(params.feedback);
            self.wet.set_target(params.wet_fraction());
        } else {
            self.delay_ms.set_current_and_target(params.delay_ms);
            self.feedback.set_current_and_target(params.feedback);
            self.wet.set_current_and_target(params.wet_fraction());
            self.primed = true;
        }
    }
}

/// The delay line signal path: ring buffer, smoothers and scratch space.
///
/// All memory is allocated in [`configure()`](Self::configure).
/// [`process_channel()`](Self::process_channel) and
/// [`advance()`](Self::advance) never allocate, lock or block.
pub struct DelayEngine {
    config: EngineConfig,
    sample_rate: f32,
    ring: RingBuffer,
    channels: Vec<ChannelState>,

    /// Holds one channel's delayed signal between the read and the mix.
    /// Its length is the largest block handled in one piece.
    scratch: Vec<f32>,

    configured: bool,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DelayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sample_rate: FALLBACK_SAMPLE_RATE,
            ring: RingBuffer::new(),
            channels: Vec::new(),
            scratch: Vec::new(),
            configured: false,
        }
    }

    /// Size the ring for `sample_rate` and `channel_count` and reset all
    /// audio state.
    ///
    /// A sample rate that isn't finite and positive, one so high the ring
    /// couldn't be addressed, or a channel count of zero is reported as an
    /// error. The engine is still configured (with [`FALLBACK_SAMPLE_RATE`]
    /// and at least one channel), so processing stays safe either way.
    pub fn configure(&mut self, sample_rate: f32, channel_count: usize) -> Result<(), ConfigError> {
        let sizes = if sample_rate.is_finite() && sample_rate > 0.0 {
            ring_sizes(sample_rate, &self.config)
                .ok_or(ConfigError::CapacityOverflow(sample_rate, FALLBACK_SAMPLE_RATE))
        } else {
            Err(ConfigError::InvalidSampleRate(sample_rate, FALLBACK_SAMPLE_RATE))
        };

        let (sample_rate, (capacity, max_block_len), mut error) = match sizes {
            Ok(sizes) => (sample_rate, sizes, None),
            Err(err) => (
                FALLBACK_SAMPLE_RATE,
                ring_sizes(FALLBACK_SAMPLE_RATE, &self.config)
                    .unwrap_or((FALLBACK_CAPACITY, FALLBACK_CAPACITY / 2)),
                Some(err),
            ),
        };
        if channel_count == 0 && error.is_none() {
            error = Some(ConfigError::NoChannels);
        }
        let channel_count = channel_count.max(1);

        self.sample_rate = sample_rate;
        self.ring
            .configure(channel_count, NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN));
        self.channels.resize_with(channel_count, ChannelState::default);
        for state in &mut self.channels {
            state.configure(sample_rate, &self.config);
        }
        self.scratch.clear();
        self.scratch.resize(max_block_len, 0.0);
        self.configured = true;

        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Silence the delay line and forget smoothing history. Sizes are kept.
    pub fn reset(&mut self) {
        self.ring.clear();
        for state in &mut self.channels {
            state.primed = false;
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn write_cursor(&self) -> usize {
        self.ring.write_cursor()
    }

    /// The longest run of samples [`process_channel()`](Self::process_channel)
    /// accepts in one call.
    pub fn max_block_len(&self) -> usize {
        self.scratch.len()
    }

    #[inline]
    fn ms_to_samples(&self, ms: f32) -> f32 {
        ms * self.sample_rate / 1000.0
    }

    /// Run one channel of the current block through the delay line, in
    /// place. `params` should already be clamped.
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32], params: &EffectParameters) {
        nih_debug_assert!(
            samples.len() <= self.scratch.len(),
            "block of {} samples exceeds the engine's maximum of {}",
            samples.len(),
            self.scratch.len()
        );
        let block_len = samples.len().min(self.scratch.len());
        if block_len == 0 {
            return;
        }
        let samples = &mut samples[..block_len];
        let samples_per_ms = self.ms_to_samples(1.0);

        let Some(state) = self.channels.get_mut(channel) else {
            return;
        };
        state.update_targets(params);

        let cursor = self.ring.write_cursor();

        // Reading further back than this would reach slots the fill below
        // has just overwritten.
        let max_delay = self.ring.capacity().saturating_sub(block_len + 1) as f32;

        // ─── 1. FILL ───
        self.ring.write_replace(channel, 0, samples);

        // ─── 2 + 3. READ and FEEDBACK ───
        let delayed = &mut self.scratch[..block_len];
        delayed.fill(0.0);

        let steady_delay = (state.delay_ms.target() * samples_per_ms).clamp(0.0, max_delay);
        if !state.delay_ms.is_smoothing() && steady_delay.floor() as usize >= block_len {
            let whole = steady_delay.floor();
            let frac = steady_delay - whole;

            let read_position = self.ring.wrap_index(cursor as isize - whole as isize);
            self.ring
                .read_accumulate_ramped(channel, read_position, delayed, 1.0 - frac, 1.0 - frac);
            if frac > 0.0 {
                let older = self.ring.wrap_index(read_position as isize - 1);
                self.ring.read_accumulate_ramped(channel, older, delayed, frac, frac);
            }

            let feedback = state.feedback.block_ramp(block_len);
            let (gliding, settled) = delayed.split_at(feedback.glide_len);
            self.ring
                .write_accumulate_ramped(channel, 0, gliding, feedback.start, feedback.end);
            self.ring.write_accumulate_ramped(
                channel,
                feedback.glide_len,
                settled,
                feedback.end,
                feedback.end,
            );
        } else {
            // Each sample uses the value a smoother shows before it steps,
            // the same value the block path's ramp gives that sample.
            for (i, out) in delayed.iter_mut().enumerate() {
                let delay = (state.delay_ms.current() * samples_per_ms).clamp(0.0, max_delay);
                let anchor = cursor + i;
                let value = self.ring.read_interpolated(channel, anchor, delay);
                self.ring
                    .add_sample(channel, anchor, value * state.feedback.current());
                *out = value;

                state.delay_ms.next_value();
                state.feedback.next_value();
            }
        }

        // ─── 4. MIX ───
        let wet = state.wet.block_ramp(block_len);
        let (gliding, settled) = samples.split_at_mut(wet.glide_len);
        let (delayed_gliding, delayed_settled) = delayed.split_at(wet.glide_len);
        mix_into(gliding, delayed_gliding, wet.start, wet.end);
        mix_into(settled, delayed_settled, wet.end, wet.end);
    }

    /// Move the shared write cursor past the block every channel just
    /// processed.
    pub fn advance(&mut self, block_len: usize) {
        self.ring.advance_cursor(block_len);
    }

    /// How many samples the echo trail keeps sounding after the input stops,
    /// or `None` if it never decays (feedback at 100 %).
    ///
    /// Each repeat is `feedback` times the previous one. The trail is
    /// inaudible once it drops below -60 dB (0.001):
    ///
    /// ```text
    /// feedback^repeats = 0.001  →  repeats = -3 / log10(feedback)
    /// ```
    ///
    /// plus the first echo, which arrives after one delay period at full
    /// level.
    pub fn tail_samples(&self, params: &EffectParameters) -> Option<u32> {
        let params = params.clamped();
        let delay_samples = f64::from(self.ms_to_samples(params.delay_ms));
        let feedback = f64::from(params.feedback);

        if feedback >= f64::from(MAX_FEEDBACK) {
            return None;
        }

        let periods = if feedback > 0.001 {
            1.0 - 3.0 / feedback.log10()
        } else {
            1.0
        };

        Some((periods * delay_samples).ceil().min(f64::from(u32::MAX)) as u32)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
