use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{OpenError, Result},
    pipeline::driver::{drive, DriveOptions},
    style::StyleModel,
    video::{FrameSink, FrameSource, VideoMetadata, VideoSink, VideoSource},
};

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub elapsed: Duration,
    pub output: PathBuf,
    /// Metadata of the input video
    pub input: VideoMetadata,
}

impl RunSummary {
    /// Average throughput of the run
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs style transfer over a whole video file
///
/// The engine follows a fixed pipeline:
/// 1. Open the input video and read its geometry
/// 2. Load the style image
/// 3. Open the output with the input's size and frame rate
/// 4. Decode, transform and encode every frame in order
/// 5. Close the output, on success and on failure alike
pub struct StyleTransferEngine {
    config: Config,
    model: StyleModel,
    cancel: Arc<AtomicBool>,
}

impl StyleTransferEngine {
    /// Create an engine around an existing model
    pub fn new(config: Config, model: StyleModel) -> Self {
        Self {
            config,
            model,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create an engine whose model is built from `config.style`
    pub fn from_config(config: Config) -> Result<Self> {
        let model = StyleModel::from_settings(&config.style)?;
        Ok(Self::new(config, model))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &StyleModel {
        &self.model
    }

    /// Flag that stops a running [`run`](Self::run) between frames when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Stylize `input` with the image at `style` and encode it to `output`
    ///
    /// Nothing is created at `output` if the input cannot be opened or the
    /// style cannot be loaded, and an `output` naming the input file itself
    /// is refused. Once frames are flowing, a failure leaves a truncated but
    /// finalized file behind.
    pub fn run<P, Q, R>(&self, input: P, style: Q, output: R) -> Result<RunSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let (input, style, output) = (input.as_ref(), style.as_ref(), output.as_ref());
        let started = Instant::now();

        info!("🎬 Starting style transfer");
        info!("   Input: {:?}", input);
        info!("   Style: {:?}", style);
        info!("   Output: {:?}", output);
        info!("   Algorithm: {}", self.model.algorithm_name());

        if same_file(input, output) {
            return Err(OpenError::OutputIsInput {
                path: output.display().to_string(),
            }
            .into());
        }

        let mut source = VideoSource::new(&self.config.video);
        source.open(input)?;
        let metadata = source.metadata();

        self.model.load_style(style)?;

        let mut sink = VideoSink::new(&self.config.video);
        sink.open(output, metadata.fps, metadata.width, metadata.height)?;
        debug!(
            "Encoding {}x{} @ {:.3} fps with {}",
            metadata.width, metadata.height, metadata.fps, self.config.video.codec
        );

        let result = self.process(&mut source, &mut sink);
        source.close();
        let frames_processed = result?;

        let summary = RunSummary {
            frames_processed,
            elapsed: started.elapsed(),
            output: output.to_path_buf(),
            input: metadata,
        };
        info!(
            "🎉 Styled {} frames in {:.1}s ({:.2} fps), saved to {:?}",
            summary.frames_processed,
            summary.elapsed.as_secs_f64(),
            summary.frames_per_second(),
            output
        );
        Ok(summary)
    }

    /// Drive frames from `source` to `sink`, then close the sink
    ///
    /// The sink is closed whether or not driving succeeded. A driving error
    /// takes precedence over a close error.
    pub fn process<S, K>(&self, source: &mut S, sink: &mut K) -> Result<u64>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        let options = DriveOptions::from_config(&self.config.processing).with_cancel(self.cancel_handle());
        let driven = drive(source, &self.model, sink, &options);
        let closed = sink.close();

        match (driven, closed) {
            (Ok(frames), Ok(())) => Ok(frames),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_error)) => {
                warn!("Closing the output after a failure also failed: {}", close_error);
                Err(e)
            }
        }
    }
}

/// Whether both paths resolve to the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StylerError, WriteError};
    use crate::pipeline::fakes::{FakeSink, FakeSource};
    use crate::style::HueShift;
    use crate::video::Frame;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn engine() -> StyleTransferEngine {
        let config = Config::default();
        let model = StyleModel::new(Box::new(HueShift::default()));
        model
            .load_style_image(&crate::video::synthetic::test_style_image(8, 8, 2), "style")
            .unwrap();
        StyleTransferEngine::new(config, model)
    }

    fn frames(count: u32) -> Vec<Frame> {
        (0..count).map(|i| crate::video::synthetic::test_frame(6, 4, i)).collect()
    }

    #[test]
    fn test_process_closes_sink_on_success() {
        let engine = engine();
        let mut source = FakeSource::new(frames(4));
        let mut sink = FakeSink::new(6, 4);

        assert_eq!(engine.process(&mut source, &mut sink).unwrap(), 4);
        assert_eq!(sink.closes, 1);
        assert_eq!(sink.written.len(), 4);
    }

    #[test]
    fn test_process_closes_sink_on_failure() {
        let engine = engine();
        let mut input = frames(4);
        input[2] = Frame::new_black(3, 3);
        let mut source = FakeSource::new(input);
        let mut sink = FakeSink::new(6, 4);

        let result = engine.process(&mut source, &mut sink);

        assert!(matches!(result, Err(StylerError::Write(WriteError::SizeMismatch { .. }))));
        assert_eq!(sink.closes, 1);
        assert_eq!(sink.written.len(), 2);
    }

    #[test]
    fn test_close_failure_is_reported() {
        let engine = engine();
        let mut source = FakeSource::new(frames(2));
        let mut sink = FakeSink::new(6, 4);
        sink.fail_close = true;

        let result = engine.process(&mut source, &mut sink);
        assert!(matches!(result, Err(StylerError::Write(WriteError::EncoderFailure { .. }))));
    }

    #[test]
    fn test_drive_error_wins_over_close_error() {
        let engine = engine();
        let mut source = FakeSource::new(frames(2)).then_fail();
        let mut sink = FakeSink::new(6, 4);
        sink.fail_close = true;

        let result = engine.process(&mut source, &mut sink);
        assert!(matches!(result, Err(StylerError::Decode(_))));
    }

    #[test]
    fn test_cancel_handle_stops_processing() {
        let engine = engine();
        engine.cancel_handle().store(true, Ordering::Relaxed);

        let mut source = FakeSource::new(frames(3));
        let mut sink = FakeSink::new(6, 4);
        let result = engine.process(&mut source, &mut sink);

        assert!(matches!(result, Err(StylerError::Cancelled { .. })));
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn test_output_over_input_is_refused() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"original bytes").unwrap();
        let output = dir.path().join(".").join("in.mp4");

        let result = engine().run(&input, dir.path().join("style.png"), &output);

        assert!(matches!(result, Err(StylerError::Open(OpenError::OutputIsInput { .. }))));
        assert_eq!(std::fs::read(&input).unwrap(), b"original bytes");
    }

    #[test]
    fn test_same_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        std::fs::write(&a, b"x").unwrap();

        assert!(same_file(&a, &dir.path().join("./a.mp4")));
        assert!(!same_file(&a, &dir.path().join("b.mp4")));
        assert!(!same_file(&dir.path().join("c.mp4"), &dir.path().join("c.mp4")));
    }

    #[test]
    fn test_from_config_rejects_unknown_algorithm() {
        let mut config = Config::default();
        config.style.algorithm = "cubism".to_string();
        assert!(matches!(
            StyleTransferEngine::from_config(config),
            Err(StylerError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_summary_rate() {
        let summary = RunSummary {
            frames_processed: 50,
            elapsed: Duration::from_secs(2),
            output: PathBuf::from("out.mp4"),
            input: VideoMetadata::default(),
        };
        assert_eq!(summary.frames_per_second(), 25.0);
    }
}
