//! # Plugin Parameters
//!
//! The knobs the DAW shows for Ring Echo. Each parameter has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to save
//!   and recall sessions. Once published, never change these IDs.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** and a **default value**.
//!
//! The parameters carry no smoother of their own. The echo engine owns a
//! nih-plug `Smoother` per value and channel and retargets it once per
//! block, so the plugin only hands over plain snapshots.

use nih_plug::prelude::*;

use crate::dsp::parameters::{
    EffectParameters, ParameterSource, MAX_DELAY_MS, MAX_FEEDBACK, MAX_MIX_PERCENT,
};

#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time** — the gap between the original and the first echo.
    ///
    /// Range: 0 ms to 2000 ms. Skewed so the short slapback range gets
    /// more knob travel than the long end.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback** — linear gain applied to each pass around the loop.
    ///
    /// - 0% = a single echo
    /// - 50% = each echo half as loud as the one before
    /// - 100% = echoes never fade
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Dry/Wet** — 0% is the untouched input, 100% is only the echoes.
    #[id = "mix"]
    pub mix: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        let defaults = EffectParameters::default();

        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                defaults.delay_ms,
                FloatRange::Skewed {
                    min: 0.0,
                    max: MAX_DELAY_MS,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            feedback: FloatParam::new(
                "Feedback",
                defaults.feedback,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_FEEDBACK,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            mix: FloatParam::new(
                "Dry/Wet",
                defaults.mix_percent,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_MIX_PERCENT,
                },
            )
            .with_unit("%")
            .with_step_size(0.1),
        }
    }
}

impl ParameterSource for PluginParams {
    /// nih-plug stores every parameter value in an atomic, so reading
    /// them here never blocks the audio thread.
    fn snapshot(&self) -> EffectParameters {
        EffectParameters {
            delay_ms: self.delay_time.value(),
            feedback: self.feedback.value(),
            mix_percent: self.mix.value(),
        }
    }
}
