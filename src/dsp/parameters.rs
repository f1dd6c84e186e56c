//! # Effect Parameters
//!
//! The echo engine never owns its parameters. Once per block it takes a
//! [`EffectParameters`] snapshot from whatever store the host uses, and
//! its own smoothers take it from there.
//!
//! Parameter values are written by a control thread (UI, automation) and
//! read by the audio thread. The handoff is one atomic scalar per
//! parameter, so the audio thread never waits on a lock.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU32, Ordering};

/// Longest delay the parameter range allows, in milliseconds.
pub const MAX_DELAY_MS: f32 = 2000.0;

/// Feedback is a linear gain. 1.0 repeats forever without decaying.
pub const MAX_FEEDBACK: f32 = 1.0;

pub const MAX_MIX_PERCENT: f32 = 100.0;

/// One block's worth of parameter values.
///
/// Conventions (shared by the read and the write path):
/// - `delay_ms`: 0..=2000 ms
/// - `feedback`: linear gain 0.0..=1.0
/// - `mix_percent`: wet amount 0..=100 %
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameters {
    pub delay_ms: f32,
    pub feedback: f32,
    pub mix_percent: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            delay_ms: 500.0,
            feedback: 0.4,
            mix_percent: 50.0,
        }
    }
}

impl EffectParameters {
    /// Pull every value into its documented range. NaN becomes the range
    /// minimum, so a malformed value from the host can't poison the
    /// ring buffer.
    pub fn clamped(self) -> Self {
        Self {
            delay_ms: clamp_or_min(self.delay_ms, 0.0, MAX_DELAY_MS),
            feedback: clamp_or_min(self.feedback, 0.0, MAX_FEEDBACK),
            mix_percent: clamp_or_min(self.mix_percent, 0.0, MAX_MIX_PERCENT),
        }
    }

    /// Wet amount as a fraction, 0.0..=1.0.
    #[inline]
    pub fn wet_fraction(&self) -> f32 {
        self.mix_percent / MAX_MIX_PERCENT
    }
}

fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Anything the engine can take a parameter snapshot from.
pub trait ParameterSource {
    fn snapshot(&self) -> EffectParameters;
}

/// An `f32` that can be shared between threads without locking.
///
/// Stores the float's bit pattern in an [`AtomicU32`].
pub struct AtomicF32 {
    inner: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn store(&self, value: f32, order: Ordering) {
        self.inner.store(value.to_bits(), order);
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.inner.load(order))
    }
}

impl Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.load(Ordering::Relaxed), f)
    }
}

/// Lock-free parameter store for hosts that don't bring their own.
///
/// Wrap it in an `Arc`, hand one clone to the control thread and one to
/// the audio thread. Each parameter is independent; a snapshot may mix an
/// old delay time with a new feedback value, which the smoothers absorb.
#[derive(Debug)]
pub struct AtomicParameters {
    delay_ms: AtomicF32,
    feedback: AtomicF32,
    mix_percent: AtomicF32,
}

impl Default for AtomicParameters {
    fn default() -> Self {
        Self::new(EffectParameters::default())
    }
}

impl AtomicParameters {
    pub fn new(initial: EffectParameters) -> Self {
        Self {
            delay_ms: AtomicF32::new(initial.delay_ms),
            feedback: AtomicF32::new(initial.feedback),
            mix_percent: AtomicF32::new(initial.mix_percent),
        }
    }

    pub fn set_delay_ms(&self, value: f32) {
        self.delay_ms.store(value, Ordering::Relaxed);
    }

    pub fn set_feedback(&self, value: f32) {
        self.feedback.store(value, Ordering::Relaxed);
    }

    pub fn set_mix_percent(&self, value: f32) {
        self.mix_percent.store(value, Ordering::Relaxed);
    }
}

impl ParameterSource for AtomicParameters {
    fn snapshot(&self) -> EffectParameters {
        EffectParameters {
            delay_ms: self.delay_ms.load(Ordering::Relaxed),
            feedback: self.feedback.load(Ordering::Relaxed),
            mix_percent: self.mix_percent.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_clamp_to_documented_ranges() {
        let wild = EffectParameters {
            delay_ms: 5000.0,
            feedback: -0.5,
            mix_percent: 250.0,
        };
        assert_eq!(
            wild.clamped(),
            EffectParameters {
                delay_ms: 2000.0,
                feedback: 0.0,
                mix_percent: 100.0,
            }
        );
    }

    #[test]
    fn test_nan_falls_back_to_minimum() {
        let params = EffectParameters {
            delay_ms: f32::NAN,
            feedback: f32::NAN,
            mix_percent: f32::INFINITY,
        }
        .clamped();
        assert_eq!(params.delay_ms, 0.0);
        assert_eq!(params.feedback, 0.0);
        assert_eq!(params.mix_percent, 100.0);
    }

    #[test]
    fn test_wet_fraction() {
        let params = EffectParameters {
            mix_percent: 25.0,
            ..Default::default()
        };
        assert_eq!(params.wet_fraction(), 0.25);
    }

    #[test]
    fn test_atomic_f32_round_trips_bits() {
        let value = AtomicF32::new(0.0);
        value.store(-3.5, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), -3.5);
    }

    #[test]
    fn test_snapshot_sees_control_thread_writes() {
        let store = Arc::new(AtomicParameters::default());

        let control = Arc::clone(&store);
        thread::spawn(move || {
            control.set_delay_ms(120.0);
            control.set_feedback(0.75);
            control.set_mix_percent(100.0);
        })
        .join()
        .unwrap();

        assert_eq!(
            store.snapshot(),
            EffectParameters {
                delay_ms: 120.0,
                feedback: 0.75,
                mix_percent: 100.0,
            }
        );
    }
}
