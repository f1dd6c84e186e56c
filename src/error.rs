//! Errors reported by the control path.
//!
//! Nothing in here can happen while audio is being processed. Bad
//! configuration is caught in `configure()`, which still leaves the engine
//! in a usable fallback state.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// Zero, negative, NaN or infinite.
    #[error("invalid sample rate {0} Hz, falling back to {1} Hz")]
    InvalidSampleRate(f32, f32),

    /// The ring for this rate would be too large to allocate or index.
    /// Any rate that fits is accepted.
    #[error("sample rate {0} Hz needs a larger delay line than can be addressed, falling back to {1} Hz")]
    CapacityOverflow(f32, f32),

    #[error("channel count must be at least 1")]
    NoChannels,
}
