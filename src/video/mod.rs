//! # Video Module
//!
//! Frame types plus the decoder ([`VideoSource`]) and encoder ([`VideoSink`])
//! ends of the pipeline. Container and codec work is delegated to an external
//! ffmpeg installation over raw rgb24 pipes.

pub mod ffmpeg;
pub mod sink;
pub mod source;
pub mod synthetic;
pub mod traits;
pub mod types;

#[cfg(all(test, unix))]
pub(crate) mod stand_ins;

pub use ffmpeg::check_available;
pub use sink::VideoSink;
pub use source::VideoSource;
pub use traits::{FrameSink, FrameSource};
pub use types::{Frame, VideoMetadata};
