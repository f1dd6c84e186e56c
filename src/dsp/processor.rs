//! # Block Processor
//!
//! The host-facing entry point. A host adapter only needs three calls:
//!
//! ```text
//! configure(sample_rate, channels)   control thread, before playback
//! process(block, params)             audio thread, once per block
//! reset()                            control thread, when playback stops
//! ```
//!
//! `process` walks the channels of a block, runs each through the
//! [`DelayEngine`] against the same write cursor, and advances the cursor
//! once at the end.

use super::engine::{DelayEngine, EngineConfig};
use super::parameters::EffectParameters;
use crate::error::ConfigError;

#[derive(Default)]
pub struct BlockProcessor {
    engine: DelayEngine,
}

impl BlockProcessor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: DelayEngine::new(config),
        }
    }

    /// Allocate everything processing will need. Must not overlap with a
    /// call to [`process()`](Self::process), which `&mut self` guarantees.
    pub fn configure(&mut self, sample_rate: f32, max_channels: usize) -> Result<(), ConfigError> {
        self.engine.configure(sample_rate, max_channels)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Process one block in place: `dry * (1 - wet) + delayed * wet`.
    ///
    /// `block` is channel-major; every channel should hold the same number
    /// of samples. Channels beyond the configured count are silenced.
    /// Blocks longer than [`DelayEngine::max_block_len()`] are handled in
    /// pieces, so any host block size is safe.
    ///
    /// Until [`configure()`](Self::configure) has been called the block is
    /// passed through untouched.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &EffectParameters) {
        if !self.engine.is_configured() {
            return;
        }

        let params = params.clamped();
        let block_len = block.iter().map(|channel| channel.len()).min().unwrap_or(0);
        let chunk_len = self.engine.max_block_len().max(1);
        let channel_count = self.engine.channel_count();

        let mut start = 0;
        while start < block_len {
            let end = (start + chunk_len).min(block_len);

            for (channel, samples) in block.iter_mut().enumerate() {
                let samples = &mut samples[start..end];
                if channel < channel_count {
                    self.engine.process_channel(channel, samples, &params);
                } else {
                    samples.fill(0.0);
                }
            }

            self.engine.advance(end - start);
            start = end;
        }
    }

    /// See [`DelayEngine::tail_samples()`].
    pub fn tail_samples(&self, params: &EffectParameters) -> Option<u32> {
        self.engine.tail_samples(params)
    }

    pub fn engine(&self) -> &DelayEngine {
        &self.engine
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
