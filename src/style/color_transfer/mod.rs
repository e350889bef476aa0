//! # Color Transfer
//!
//! Single-pass statistics transfer: every channel of the frame is shifted and
//! scaled so its mean and spread match the style's, then blended with the
//! input according to the loss weights.

mod effect;

pub use effect::ColorTransfer;

/// Below this spread a channel is treated as flat and only shifted
pub const MIN_STD_DEV: f64 = 1e-6;
