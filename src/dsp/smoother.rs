//! # Smoothed Parameter
//!
//! When a user moves a knob, the parameter value jumps instantly. Feeding
//! that jump straight into the audio path creates a discontinuity that
//! sounds like a click (or "zipper noise" while the knob is moving).
//!
//! A [`SmoothedParameter`] glides from its current value to a new target
//! in equal steps over a fixed number of samples, using nih-plug's
//! [`Smoother`] with [`SmoothingStyle::Linear`]:
//!
//! ```text
//! target set to 1.0 while current = 0.0, ramp = 4 samples
//!
//! next_value(): 0.25, 0.5, 0.75, 1.0, 1.0, 1.0 ...
//! ```
//!
//! Unlike the smoothers nih-plug attaches to a `FloatParam`, these are
//! owned per channel by the echo engine, which decides when targets
//! change (once per block).
//!
//! A linear ramp has a known end point, which lets the engine handle a
//! whole block with [`block_ramp()`](SmoothedParameter::block_ramp)
//! instead of stepping sample by sample.

use nih_plug::prelude::{Smoother, SmoothingStyle};

/// The gain curve of one parameter across one block.
///
/// Samples `0..glide_len` ramp linearly from `start` toward `end`; samples
/// from `glide_len` on sit at `end`. Sample `i` of the glide gets exactly
/// the value [`SmoothedParameter::current()`] would have shown before the
/// `i`-th call to [`SmoothedParameter::next_value()`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRamp {
    pub start: f32,
    pub end: f32,
    pub glide_len: usize,
}

/// A value that ramps linearly toward its target, one sample at a time.
pub struct SmoothedParameter {
    inner: Smoother<f32>,
    sample_rate: f32,

    /// Glide duration in samples; 0 means targets apply instantly.
    ramp_length: u32,

    target: f32,

    /// Direction of the glide in progress, used to keep rounding error
    /// from carrying the value past its target.
    rising: bool,
}

impl Default for SmoothedParameter {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SmoothedParameter {
    /// Create a parameter resting at `initial`. Until configured, new
    /// targets are applied instantly.
    pub fn new(initial: f32) -> Self {
        let inner = Smoother::none();
        inner.reset(initial);

        Self {
            inner,
            sample_rate: 0.0,
            ramp_length: 0,
            target: initial,
            rising: true,
        }
    }

    /// Set how long a glide takes. Any glide in progress is finished
    /// immediately.
    ///
    /// # Arguments
    /// * `sample_rate` - Rate at which [`next_value()`](Self::next_value)
    ///   will be called, in Hz.
    /// * `ramp_time_seconds` - Glide duration. 0 disables smoothing.
    pub fn configure(&mut self, sample_rate: f32, ramp_time_seconds: f32) {
        let ramp_ms = ramp_time_seconds * 1000.0;
        // Same step count nih-plug derives for `SmoothingStyle::Linear`.
        let steps = (sample_rate * ramp_ms / 1000.0).round();

        if steps.is_finite() && steps >= 1.0 {
            self.inner = Smoother::new(SmoothingStyle::Linear(ramp_ms));
            self.sample_rate = sample_rate;
            self.ramp_length = steps.min(u32::MAX as f32) as u32;
        } else {
            self.inner = Smoother::none();
            self.sample_rate = 0.0;
            self.ramp_length = 0;
        }
        self.set_current_and_target(self.target);
    }

    /// Start gliding from wherever the value is now toward `value`.
    ///
    /// Setting the same target again does not restart the glide.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }

        if self.ramp_length == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.rising = value >= self.current();
        self.target = value;
        self.inner.set_target(self.sample_rate, value);
    }

    /// Jump straight to `value` with no glide.
    pub fn set_current_and_target(&mut self, value: f32) {
        self.target = value;
        self.rising = true;
        self.inner.reset(value);
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if !self.is_smoothing() {
            return self.target;
        }
        let value = self.inner.next();
        self.clamp_to_target(value)
    }

    /// Advance `count` samples at once and return the value reached.
    ///
    /// Equivalent to calling [`next_value()`](Self::next_value) `count`
    /// times, up to floating point rounding.
    pub fn skip(&mut self, count: usize) -> f32 {
        if count == 0 {
            return self.current();
        }
        if !self.is_smoothing() {
            return self.target;
        }
        let value = self.inner.next_step(count.min(u32::MAX as usize) as u32);
        self.clamp_to_target(value)
    }

    /// The gain curve for the next `block_len` samples. Advances the
    /// parameter past the block.
    pub fn block_ramp(&mut self, block_len: usize) -> BlockRamp {
        let start = self.current();
        let glide_len = self.steps_left().min(block_len);
        let end = if glide_len > 0 {
            self.skip(glide_len)
        } else {
            start
        };

        BlockRamp {
            start,
            end,
            glide_len,
        }
    }

    /// The value most recently returned, or the resting value.
    #[inline]
    pub fn current(&self) -> f32 {
        self.clamp_to_target(self.inner.previous_value())
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.inner.steps_left() > 0
    }

    #[inline]
    fn steps_left(&self) -> usize {
        self.inner.steps_left().max(0) as usize
    }

    /// Rounding error must never carry the value past its target.
    #[inline]
    fn clamp_to_target(&self, value: f32) -> f32 {
        if self.rising {
            value.min(self.target)
        } else {
            value.max(self.target)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
