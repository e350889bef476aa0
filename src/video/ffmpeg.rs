//! ffmpeg/ffprobe subprocess plumbing shared by [`VideoSource`](super::VideoSource)
//! and [`VideoSink`](super::VideoSink).
//!
//! Frames cross the process boundary as headerless `rgb24` rawvideo, so the
//! byte stream on the pipe is exactly `width * height * 3` bytes per frame.

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::VideoConfig;
use crate::error::OpenError;
use crate::video::types::VideoMetadata;

/// Number of trailing stderr lines kept when reporting a failure
const STDERR_TAIL_LINES: usize = 6;

/// Check whether an ffmpeg-family executable can be launched
pub fn check_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// A running ffmpeg child process
///
/// stderr is drained on a helper thread so a chatty child can never block on
/// a full pipe. Dropping an unfinished process kills and reaps it.
pub(crate) struct FfmpegProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    label: String,
    finished: bool,
}

impl FfmpegProcess {
    pub fn spawn(mut cmd: Command, label: impl Into<String>) -> std::io::Result<Self> {
        let label = label.into();
        cmd.stderr(Stdio::piped());
        debug!("Spawning {}: {:?}", label, cmd);

        let mut child = cmd.spawn()?;
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                let _ = pipe.read_to_end(&mut bytes);
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });

        Ok(Self {
            child,
            stderr,
            label,
            finished: false,
        })
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Wait for the process to exit and report a failed exit status
    ///
    /// Callers must have closed stdin / drained stdout first.
    pub fn finish(&mut self) -> Result<(), String> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let status = self.child.wait().map_err(|e| format!("{} wait failed: {}", self.label, e))?;
        let stderr = self.collect_stderr();

        if status.success() {
            if !stderr.trim().is_empty() {
                debug!("{} stderr: {}", self.label, stderr.trim());
            }
            Ok(())
        } else {
            Err(format!("{} exited with {}: {}", self.label, status, tail(&stderr)))
        }
    }

    /// Kill the process without inspecting its exit status
    pub fn terminate(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Err(e) = self.child.kill() {
            debug!("{} already exited: {}", self.label, e);
        }
        if let Err(e) = self.child.wait() {
            warn!("Failed to reap {}: {}", self.label, e);
        }
        let _ = self.collect_stderr();
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no diagnostic output".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

// ==========================================
// METADATA PROBING
// ==========================================

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Read container metadata for the first video stream of `path`
pub(crate) fn probe(ffprobe: &str, path: &Path) -> Result<VideoMetadata, OpenError> {
    let path_str = path.display().to_string();

    let output = Command::new(ffprobe)
        .args(["-v", "error", "-select_streams", "v:0", "-show_streams", "-show_format", "-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|_| OpenError::ToolUnavailable { program: ffprobe.to_string() })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OpenError::UnsupportedFormat {
            path: path_str,
            reason: tail(&stderr),
        });
    }

    let json = String::from_utf8_lossy(&output.stdout);
    parse_probe_json(&json).map_err(|reason| OpenError::UnsupportedFormat {
        path: path_str,
        reason,
    })
}

/// Turn ffprobe's JSON report into [`VideoMetadata`]
pub(crate) fn parse_probe_json(json: &str) -> Result<VideoMetadata, String> {
    let report: ProbeOutput =
        serde_json::from_str(json).map_err(|e| format!("unreadable probe output: {}", e))?;

    let stream = report
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or_else(|| "no video stream".to_string())?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(format!("unusable frame size {}x{}", width, height));
    }

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .ok_or_else(|| "unknown frame rate".to_string())?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);

    let duration = stream
        .duration
        .as_deref()
        .or_else(|| report.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        frame_count,
        fps,
        width,
        height,
        codec: stream.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
        duration,
    })
}

/// Parse an ffmpeg rational such as `30000/1001`
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value > 0.0 && value.is_finite()).then_some(value)
}

// ==========================================
// COMMAND BUILDERS
// ==========================================

/// ffmpeg invocation that decodes the first video stream to rgb24 on stdout
pub(crate) fn decode_command(ffmpeg: &str, input: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(input)
        .args(["-map", "0:v:0", "-an", "-sn", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped());
    cmd
}

/// ffmpeg invocation that encodes rgb24 frames read from stdin
pub(crate) fn encode_command(
    config: &VideoConfig,
    output: &Path,
    width: u32,
    height: u32,
    fps: f64,
) -> Command {
    let mut cmd = Command::new(&config.ffmpeg_path);
    cmd.args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
        .arg("-s")
        .arg(format!("{}x{}", width, height))
        .arg("-r")
        .arg(fps.to_string())
        .args(["-i", "-", "-an", "-c:v", &config.codec, "-pix_fmt", &config.pixel_format])
        .args(quality_args(&config.codec, config.quality))
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null());
    cmd
}

/// Map the 1-100 quality knob onto the codec's own rate control
fn quality_args(codec: &str, quality: u8) -> Vec<String> {
    let quality = quality.clamp(1, 100) as f32 / 100.0;
    match codec {
        "libx264" | "libx265" | "libvpx-vp9" | "libaom-av1" | "libsvtav1" => {
            let crf = (51 - (quality * 51.0) as u8).clamp(0, 51);
            vec!["-crf".to_string(), crf.to_string()]
        }
        _ => {
            // qscale codecs (mpeg4, mjpeg, ...): 2 is best, 31 is worst
            let qscale = (31 - (quality * 29.0) as u8).clamp(2, 31);
            vec!["-q:v".to_string(), qscale.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|s| s.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("garbage"), None);
    }

    #[test]
    fn test_parse_probe_json() {
        let json = r#"{
            "streams": [{
                "codec_type": "video",
                "codec_name": "mpeg4",
                "width": 640,
                "height": 480,
                "r_frame_rate": "30/1",
                "avg_frame_rate": "30/1",
                "nb_frames": "10",
                "duration": "0.333333"
            }],
            "format": { "duration": "0.333333" }
        }"#;

        let metadata = parse_probe_json(json).unwrap();
        assert_eq!(metadata.dimensions(), (640, 480));
        assert_eq!(metadata.fps, 30.0);
        assert_eq!(metadata.frame_count, 10);
        assert_eq!(metadata.codec, "mpeg4");
        assert!((metadata.duration - 0.333333).abs() < 1e-6);
    }

    #[test]
    fn test_missing_frame_count_is_zero() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 320, "height": 240,
                        "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
                       "format": {"duration": "N/A"}}"#;

        let metadata = parse_probe_json(json).unwrap();
        assert_eq!(metadata.frame_count, 0);
        assert_eq!(metadata.fps, 25.0);
        assert_eq!(metadata.duration, 0.0);
    }

    #[test]
    fn test_no_video_stream_is_rejected() {
        assert!(parse_probe_json(r#"{"streams": [], "format": {}}"#).is_err());
        assert!(parse_probe_json("not json").is_err());

        let zero_size = r#"{"streams": [{"codec_type": "video", "width": 0, "height": 0, "r_frame_rate": "30/1"}]}"#;
        assert!(parse_probe_json(zero_size).is_err());
    }

    #[test]
    fn test_decode_command() {
        let cmd = decode_command("ffmpeg_test", &PathBuf::from("/tmp/in.mp4"));
        let args = args_of(&cmd);

        assert_eq!(cmd.get_program().to_str().unwrap(), "ffmpeg_test");
        assert!(args.contains(&"/tmp/in.mp4".to_string()));
        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"rgb24".to_string()));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_encode_command() {
        let config = VideoConfig::default();
        let cmd = encode_command(&config, &PathBuf::from("/tmp/out.mp4"), 640, 480, 30.0);
        let args = args_of(&cmd);

        assert!(args.contains(&"640x480".to_string()));
        assert!(args.contains(&"30".to_string()));
        assert!(args.contains(&"mpeg4".to_string()));
        assert!(args.contains(&"-q:v".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn test_quality_args() {
        assert_eq!(quality_args("libx264", 100), vec!["-crf", "0"]);
        assert_eq!(quality_args("mpeg4", 100), vec!["-q:v", "2"]);
        assert_eq!(quality_args("mpeg4", 1), vec!["-q:v", "31"]);
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(tail(""), "no diagnostic output");
        let long: String = (0..10).map(|i| format!("line {}\n", i)).collect();
        assert_eq!(tail(&long), "line 4 | line 5 | line 6 | line 7 | line 8 | line 9");
    }
}
