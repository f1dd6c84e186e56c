//! # DSP
//!
//! The echo signal path, leaf to root:
//!
//! - **`gain`**: linear gain ramps over sample slices.
//! - **`parameters`**: the per-block parameter snapshot and a lock-free
//!   store for hosts without their own.
//! - **`smoother`**: per-sample linear glides toward a target value.
//! - **`ring_buffer`**: per-channel circular sample history with one shared
//!   write cursor and wrap-splitting block copies.
//! - **`engine`**: fill, read, feedback and mix for one channel of a block.
//! - **`processor`**: runs all channels of a block and advances the cursor.

pub mod engine;
pub mod gain;
pub mod parameters;
pub mod processor;
pub mod ring_buffer;
pub mod smoother;
