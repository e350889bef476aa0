//! # Video-Styler
//!
//! Apply the look of a reference image to every frame of a video.
//!
//! This library decodes a video frame by frame, runs each frame through a
//! style transform driven by a single style image, and encodes the results
//! into a new video with the same size and frame rate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use video_styler::{config::Config, pipeline::StyleTransferEngine};
//!
//! # fn main() -> video_styler::Result<()> {
//! let engine = StyleTransferEngine::from_config(Config::default())?;
//! let summary = engine.run("input.mp4", "style.jpg", "output.mp4")?;
//! println!("styled {} frames", summary.frames_processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Frame types, ffmpeg-backed decoder and encoder
//! - [`style`] - Style model and the style transfer algorithms
//! - [`pipeline`] - Frame-by-frame driver and the run orchestration
//! - [`config`] - Configuration management
//!
//! ## Custom Algorithms
//!
//! Implement [`StyleAlgorithm`](style::StyleAlgorithm) and hand it to a
//! [`StyleModel`](style::StyleModel):
//!
//! ```rust,no_run
//! use image::Rgb32FImage;
//! use video_styler::error::TransformError;
//! use video_styler::style::{StyleAlgorithm, StyleModel, StyleParameters, StyleReference};
//!
//! struct Invert;
//!
//! impl StyleAlgorithm for Invert {
//!     fn name(&self) -> &str {
//!         "invert"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Inverts every channel"
//!     }
//!
//!     fn stylize(
//!         &self,
//!         content: &Rgb32FImage,
//!         _style: &StyleReference,
//!         _params: &StyleParameters,
//!     ) -> Result<Rgb32FImage, TransformError> {
//!         let mut out = content.clone();
//!         out.iter_mut().for_each(|v| *v = 1.0 - *v);
//!         Ok(out)
//!     }
//! }
//!
//! let model = StyleModel::new(Box::new(Invert));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod style;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, StylerError},
    pipeline::{RunSummary, StyleTransferEngine},
    style::{StyleAlgorithm, StyleModel},
    video::{Frame, VideoSink, VideoSource},
};
