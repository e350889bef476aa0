use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::ChildStdout;

use tracing::{debug, info, warn};

use crate::config::VideoConfig;
use crate::error::{DecodeError, OpenError};
use crate::video::ffmpeg::{self, FfmpegProcess};
use crate::video::traits::FrameSource;
use crate::video::types::{Frame, VideoMetadata};

/// Reads frames out of a video container, in decode order
///
/// The source is single pass: once [`next_frame`](Self::next_frame) returns
/// `Ok(None)` it keeps doing so until the file is opened again. The decoder
/// process lives as long as the source is open and is killed when the source
/// is closed or dropped.
pub struct VideoSource {
    ffmpeg_path: String,
    ffprobe_path: String,
    decoder: Option<Decoder>,
    metadata: VideoMetadata,
    frames_read: u64,
}

struct Decoder {
    process: FfmpegProcess,
    stdout: ChildStdout,
    path: PathBuf,
    frame_bytes: usize,
    exhausted: bool,
}

impl VideoSource {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            decoder: None,
            metadata: VideoMetadata::default(),
            frames_read: 0,
        }
    }

    /// Open a video file and start decoding it
    ///
    /// Any previously open file is released first. On failure the source is
    /// left closed with zeroed metadata.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), OpenError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        self.close();
        self.metadata = VideoMetadata::default();
        self.frames_read = 0;

        if !path.exists() {
            return Err(OpenError::NotFound { path: path_str });
        }
        if !path.is_file() {
            return Err(OpenError::UnsupportedFormat {
                path: path_str,
                reason: "not a regular file".to_string(),
            });
        }

        let metadata = ffmpeg::probe(&self.ffprobe_path, path)?;

        let mut process = FfmpegProcess::spawn(ffmpeg::decode_command(&self.ffmpeg_path, path), "decoder")
            .map_err(|_| OpenError::ToolUnavailable { program: self.ffmpeg_path.clone() })?;
        let stdout = process.take_stdout().ok_or_else(|| OpenError::UnsupportedFormat {
            path: path_str.clone(),
            reason: "decoder produced no output pipe".to_string(),
        })?;

        info!(
            "Opened {}: {}x{} @ {:.2} fps, {} frames advertised ({})",
            path_str, metadata.width, metadata.height, metadata.fps, metadata.frame_count, metadata.codec
        );
        if metadata.frame_count == 0 {
            debug!("Container does not advertise a frame count");
        }

        self.decoder = Some(Decoder {
            process,
            stdout,
            path: path.to_path_buf(),
            frame_bytes: Frame::byte_len(metadata.width, metadata.height),
            exhausted: false,
        });
        self.metadata = metadata;
        Ok(())
    }

    /// Metadata of the open file; zeroed before a successful open
    pub fn metadata(&self) -> VideoMetadata {
        self.metadata.clone()
    }

    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    /// Frames produced since the last open
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Decode the next frame, or `Ok(None)` at end of stream
    pub fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        let decoder = self.decoder.as_mut().ok_or(DecodeError::NotOpen)?;
        if decoder.exhausted {
            return Ok(None);
        }

        let mut buffer = vec![0u8; decoder.frame_bytes];
        let received = read_full(&mut decoder.stdout, &mut buffer).map_err(|e| {
            decoder.exhausted = true;
            DecodeError::DecoderFailed {
                path: decoder.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        if received == 0 {
            decoder.exhausted = true;
            decoder.process.finish().map_err(|reason| DecodeError::DecoderFailed {
                path: decoder.path.display().to_string(),
                reason,
            })?;
            debug!("End of stream after {} frames", self.frames_read);
            return Ok(None);
        }

        if received < decoder.frame_bytes {
            decoder.exhausted = true;
            return Err(DecodeError::Truncated {
                path: decoder.path.display().to_string(),
                expected: decoder.frame_bytes,
                received,
            });
        }

        self.frames_read += 1;
        let frame = Frame::from_rgb_bytes(self.metadata.width, self.metadata.height, buffer)
            .ok_or_else(|| DecodeError::DecoderFailed {
                path: decoder.path.display().to_string(),
                reason: "frame buffer does not match stream geometry".to_string(),
            })?;
        Ok(Some(frame))
    }

    /// Release the decoder; safe to call repeatedly
    pub fn close(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            let Decoder { mut process, stdout, path, exhausted, .. } = decoder;
            drop(stdout);
            if !exhausted {
                warn!("Closing {} before end of stream ({} frames read)", path.display(), self.frames_read);
            }
            process.terminate();
        }
    }
}

impl FrameSource for VideoSource {
    fn metadata(&self) -> VideoMetadata {
        VideoSource::metadata(self)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        VideoSource::next_frame(self)
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
