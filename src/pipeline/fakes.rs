//! In-memory frame sources and sinks for pipeline tests

use std::collections::VecDeque;

use crate::error::{DecodeError, WriteError};
use crate::video::{Frame, FrameSink, FrameSource, VideoMetadata};

pub(crate) struct FakeSource {
    frames: VecDeque<Frame>,
    fail_at_end: bool,
    metadata: VideoMetadata,
    pub reads: usize,
}

impl FakeSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        let (width, height) = frames.first().map_or((0, 0), Frame::dimensions);
        let metadata = VideoMetadata {
            frame_count: frames.len() as u64,
            fps: 25.0,
            width,
            height,
            codec: "raw".to_string(),
            duration: frames.len() as f64 / 25.0,
        };
        Self {
            frames: frames.into(),
            fail_at_end: false,
            metadata,
            reads: 0,
        }
    }

    /// Report a truncated frame instead of end of stream
    pub fn then_fail(mut self) -> Self {
        self.fail_at_end = true;
        self
    }
}

impl FrameSource for FakeSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata.clone()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.reads += 1;
                Ok(Some(frame))
            }
            None if self.fail_at_end => Err(DecodeError::Truncated {
                path: "fake".to_string(),
                expected: 24,
                received: 5,
            }),
            None => Ok(None),
        }
    }
}

pub(crate) struct FakeSink {
    width: u32,
    height: u32,
    pub written: Vec<Frame>,
    pub closes: usize,
    pub fail_close: bool,
}

impl FakeSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            written: Vec::new(),
            closes: 0,
            fail_close: false,
        }
    }
}

impl FrameSink for FakeSink {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriteError> {
        if self.closes > 0 {
            return Err(WriteError::Closed);
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(WriteError::SizeMismatch {
                frame: self.written.len() as u64,
                expected: (self.width, self.height),
                actual: frame.dimensions(),
            });
        }
        self.written.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.closes += 1;
        if self.fail_close {
            return Err(WriteError::EncoderFailure {
                path: "fake".to_string(),
                reason: "fake encoder exited with status 1".to_string(),
            });
        }
        Ok(())
    }
}
