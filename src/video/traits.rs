use crate::error::{DecodeError, WriteError};
use crate::video::types::{Frame, VideoMetadata};

/// Anything that yields decoded frames in presentation order
///
/// The pipeline driver only depends on this trait, so in-memory sources can
/// stand in for a real decoder.
pub trait FrameSource {
    /// Geometry and rate of the stream
    fn metadata(&self) -> VideoMetadata;

    /// Next frame, or `Ok(None)` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError>;
}

/// Anything that accepts frames in order and turns them into a video stream
pub trait FrameSink {
    /// Output geometry as (width, height)
    fn dimensions(&self) -> (u32, u32);

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriteError>;

    /// Flush and release the underlying encoder. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), WriteError>;
}
