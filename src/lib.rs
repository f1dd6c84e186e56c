//! # Ring Echo — A Circular-Buffer Echo Plugin
//!
//! A block-based delay/echo effect built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). Outputs Audio Unit
//! (AUv2), VST3, and CLAP formats from a single codebase.
//!
//! The signal path lives in [`dsp`] and has no plugin dependencies in its
//! API: any host can drive [`BlockProcessor`] with plain `configure` and
//! `process` calls. The [`Plugin`] implementation below is a thin wrapper
//! around it.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬─────────────────────────────────────────── × (1 - wet) ──┐
//!         │                                                          │
//!         │      ┌────────────── FEEDBACK LOOP ──────────────┐       │
//!         │      │                                           │       │
//!         └────►(+)──► [Ring Buffer] ──► delayed ──► × feedback      │
//!                          │                                         │
//!                          └──────────────────────── × wet ────────►(+)──► Output
//! ```

pub mod dsp;
pub mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use dsp::engine::{DelayEngine, EngineConfig};
pub use dsp::parameters::{AtomicParameters, EffectParameters, ParameterSource};
pub use dsp::processor::BlockProcessor;
pub use error::ConfigError;
use params::PluginParams;

/// The plugin instance.
///
/// Parameters are shared with the host through an `Arc` and may be read
/// from any thread. The block processor (ring buffer, smoothers) is owned
/// by the audio thread and only touched in `initialize()`, `reset()` and
/// `process()`, which the host never runs concurrently.
struct RingEcho {
    params: Arc<PluginParams>,
    processor: BlockProcessor,
}

impl Default for RingEcho {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // Unconfigured until initialize(): no buffers allocated yet.
            processor: BlockProcessor::default(),
        }
    }
}

impl Plugin for RingEcho {
    const NAME: &'static str = "Ring Echo";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, mono as a fallback. Input and output always match.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are sampled once per block and smoothed by the engine.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is loaded or the sample rate / layout
    /// changes. All ring buffer memory is allocated here.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_output_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        match self
            .processor
            .configure(buffer_config.sample_rate, num_channels)
        {
            Ok(()) => {
                nih_log!(
                    "ring echo configured: {} Hz, {} channels, {} samples of history",
                    buffer_config.sample_rate,
                    num_channels,
                    self.processor.engine().capacity()
                );
                true
            }
            Err(err) => {
                nih_warn!("rejecting audio configuration: {}", err);
                false
            }
        }
    }

    /// Playback stopped: drop the stored echoes so they don't burst out on
    /// the next play.
    fn reset(&mut self) {
        self.processor.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let params = self.params.snapshot();
        self.processor.process(buffer.as_slice(), &params);

        // Keep the host calling process() after the input goes silent,
        // otherwise the echo trail would be cut off.
        match self.processor.tail_samples(&params) {
            Some(tail) => ProcessStatus::Tail(tail),
            None => ProcessStatus::KeepAlive,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for RingEcho {
    const CLAP_ID: &'static str = "com.loveless-audio.ring-echo";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A circular-buffer echo with feedback and dry/wet mix");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for RingEcho {
    // `*b"..."` turns the 16-character ASCII literal into a `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"RingEchoLvlss001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// nih_export_clap! exports `clap_entry`, nih_export_vst3! exports
// `GetPluginFactory`. clap_wrapper adds `GetPluginFactoryAUV2` on top of
// the CLAP entry so Logic Pro can load the plugin as an Audio Unit.
nih_export_clap!(RingEcho);
nih_export_vst3!(RingEcho);
clap_wrapper::export_auv2!();
