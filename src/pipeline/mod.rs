//! # Pipeline
//!
//! Moves frames from a [`FrameSource`](crate::video::FrameSource) through the
//! [`StyleModel`](crate::style::StyleModel) into a
//! [`FrameSink`](crate::video::FrameSink), one at a time and in order.

pub mod driver;
pub mod engine;

#[cfg(test)]
pub(crate) mod fakes;

pub use driver::{drive, DriveOptions};
pub use engine::{RunSummary, StyleTransferEngine};
