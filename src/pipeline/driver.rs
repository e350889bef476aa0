use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    config::ProcessingConfig,
    error::{DecodeError, Result, StylerError, WriteError},
    style::StyleModel,
    video::{Frame, FrameSink, FrameSource},
};

/// How [`drive`] schedules and reports its work
#[derive(Debug, Clone)]
pub struct DriveOptions {
    /// Frames transformed in parallel per batch; 1 is strictly sequential
    pub frame_batch: usize,

    /// Log progress every this many frames; 0 disables progress logs
    pub progress_interval: u64,

    /// Checked between frames; when set the run stops with `Cancelled`
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            frame_batch: 1,
            progress_interval: 30,
            cancel: None,
        }
    }
}

impl DriveOptions {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            frame_batch: config.frame_batch.max(1),
            progress_interval: config.progress_interval,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

/// Pump every frame from `source` through `model` into `sink`
///
/// Frames are written in the order they were decoded. The first decode,
/// transform or write error ends the run and is returned; frames already
/// written stay written. The sink is not closed here. A sink whose geometry
/// differs from the source's advertised frame size fails before any frame
/// is read.
///
/// Returns the number of frames written.
pub fn drive<S, K>(source: &mut S, model: &StyleModel, sink: &mut K, options: &DriveOptions) -> Result<u64>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let metadata = source.metadata();
    if metadata.width > 0 && metadata.height > 0 && sink.dimensions() != metadata.dimensions() {
        return Err(WriteError::SizeMismatch {
            frame: 0,
            expected: sink.dimensions(),
            actual: metadata.dimensions(),
        }
        .into());
    }

    let mut progress = Progress::new(metadata.frame_count, options.progress_interval);

    if options.frame_batch <= 1 {
        loop {
            if options.cancelled() {
                return Err(StylerError::Cancelled { frames_processed: progress.done });
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };
            let styled = model
                .transform(frame)
                .map_err(|source| StylerError::FrameFailed { index: progress.done, source })?;
            sink.write_frame(&styled)?;
            progress.advance();
        }
    } else {
        drive_batched(source, model, sink, options, &mut progress)?;
    }

    debug!("Source exhausted after {} frames", progress.done);
    Ok(progress.done)
}

fn drive_batched<S, K>(
    source: &mut S,
    model: &StyleModel,
    sink: &mut K,
    options: &DriveOptions,
    progress: &mut Progress,
) -> Result<()>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let batch_size = options.frame_batch;
    let mut batch: Vec<Frame> = Vec::with_capacity(batch_size);

    loop {
        if options.cancelled() {
            return Err(StylerError::Cancelled { frames_processed: progress.done });
        }

        // A decode error is held back until the frames before it are written
        let mut decode_error: Option<DecodeError> = None;
        let mut exhausted = false;
        while batch.len() < batch_size {
            match source.next_frame() {
                Ok(Some(frame)) => batch.push(frame),
                Ok(None) => {
                    exhausted = true;
                    break;
                }
                Err(e) => {
                    decode_error = Some(e);
                    break;
                }
            }
        }

        let results: Vec<_> = batch
            .par_drain(..)
            .map(|frame| model.transform(frame))
            .collect();

        for result in results {
            let styled = result.map_err(|source| StylerError::FrameFailed { index: progress.done, source })?;
            sink.write_frame(&styled)?;
            progress.advance();
        }

        if let Some(e) = decode_error {
            return Err(e.into());
        }
        if exhausted {
            return Ok(());
        }
    }
}

struct Progress {
    total: u64,
    interval: u64,
    done: u64,
    started: Instant,
}

impl Progress {
    fn new(total: u64, interval: u64) -> Self {
        Self {
            total,
            interval,
            done: 0,
            started: Instant::now(),
        }
    }

    fn advance(&mut self) {
        self.done += 1;
        if self.interval == 0 || self.done % self.interval != 0 {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { self.done as f64 / elapsed } else { 0.0 };
        if self.total > 0 {
            info!(
                "Processed {}/{} frames ({:.1}%, {:.2} fps)",
                self.done,
                self.total,
                self.done as f64 * 100.0 / self.total as f64,
                rate
            );
        } else {
            info!("Processed {} frames ({:.2} fps)", self.done, rate);
        }
    }
}
