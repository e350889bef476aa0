use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::ChildStdin;

use tracing::{debug, info, warn};

use crate::config::VideoConfig;
use crate::error::{OpenError, WriteError};
use crate::video::ffmpeg::{self, FfmpegProcess};
use crate::video::traits::FrameSink;
use crate::video::types::Frame;

/// Encodes frames into an output video with fixed geometry and frame rate
///
/// The encoder is released exactly once: by [`close`](Self::close) or, if
/// that never happens, when the sink is dropped.
pub struct VideoSink {
    config: VideoConfig,
    encoder: Option<Encoder>,
    dimensions: (u32, u32),
    fps: f64,
    frames_written: u64,
}

struct Encoder {
    process: FfmpegProcess,
    stdin: ChildStdin,
    path: PathBuf,
}

impl VideoSink {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            config: config.clone(),
            encoder: None,
            dimensions: (0, 0),
            fps: 0.0,
            frames_written: 0,
        }
    }

    /// Start an encoder writing to `path`
    ///
    /// Non-positive geometry or frame rate is rejected, never clamped.
    pub fn open<P: AsRef<Path>>(&mut self, path: P, fps: f64, width: u32, height: u32) -> Result<(), OpenError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if width == 0 || height == 0 || !(fps > 0.0 && fps.is_finite()) {
            return Err(OpenError::InvalidGeometry { width, height, fps });
        }

        if self.encoder.is_some() {
            if let Err(e) = self.close() {
                warn!("Previous output did not close cleanly: {}", e);
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(OpenError::EncoderFailed {
                    path: path_str,
                    reason: format!("output directory {} does not exist", parent.display()),
                });
            }
        }

        let cmd = ffmpeg::encode_command(&self.config, path, width, height, fps);
        let mut process = FfmpegProcess::spawn(cmd, "encoder").map_err(|e| match e.kind() {
            ErrorKind::NotFound => OpenError::ToolUnavailable { program: self.config.ffmpeg_path.clone() },
            _ => OpenError::EncoderFailed { path: path_str.clone(), reason: e.to_string() },
        })?;
        let stdin = process.take_stdin().ok_or_else(|| OpenError::EncoderFailed {
            path: path_str.clone(),
            reason: "encoder has no input pipe".to_string(),
        })?;

        info!(
            "Writing {} ({}x{} @ {:.2} fps, codec {})",
            path_str, width, height, fps, self.config.codec
        );

        self.encoder = Some(Encoder {
            process,
            stdin,
            path: path.to_path_buf(),
        });
        self.dimensions = (width, height);
        self.fps = fps;
        self.frames_written = 0;
        Ok(())
    }

    /// Append a frame to the output stream
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), WriteError> {
        let encoder = self.encoder.as_mut().ok_or(WriteError::Closed)?;

        if frame.dimensions() != self.dimensions {
            return Err(WriteError::SizeMismatch {
                frame: self.frames_written,
                expected: self.dimensions,
                actual: frame.dimensions(),
            });
        }

        if let Err(e) = encoder.stdin.write_all(frame.as_rgb_bytes()) {
            // The encoder died; its stderr says why
            let (path, reason) = match self.encoder.take() {
                Some(Encoder { mut process, stdin, path }) => {
                    drop(stdin);
                    let reason = process.finish().err().unwrap_or_else(|| e.to_string());
                    (path.display().to_string(), reason)
                }
                None => (String::new(), e.to_string()),
            };
            return Err(WriteError::EncoderFailure { path, reason });
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Finish the stream and wait for the encoder to exit
    pub fn close(&mut self) -> Result<(), WriteError> {
        let Some(Encoder { mut process, stdin, path }) = self.encoder.take() else {
            return Ok(());
        };

        drop(stdin);
        process
            .finish()
            .map_err(|reason| WriteError::EncoderFailure {
                path: path.display().to_string(),
                reason,
            })?;

        info!("Encoded {} frames to {}", self.frames_written, path.display());
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.encoder.is_some()
    }

    /// Output geometry declared at open, (0, 0) before
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for VideoSink {
    fn dimensions(&self) -> (u32, u32) {
        VideoSink::dimensions(self)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), WriteError> {
        VideoSink::write_frame(self, frame)
    }

    fn close(&mut self) -> Result<(), WriteError> {
        VideoSink::close(self)
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            debug!("Video sink dropped while open, closing");
            if let Err(e) = self.close() {
                warn!("Failed to close video sink: {}", e);
            }
        }
    }
}
