//! # Hue Shift
//!
//! Rotates the hue of every pixel by a fixed angle. The style image only has
//! to be loaded; its content is not used.

mod effect;

pub use effect::HueShift;

pub const DEFAULT_DEGREES: f32 = 20.0;
